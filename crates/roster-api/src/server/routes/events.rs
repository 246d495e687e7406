async fn event_stat_update(
    State(state): State<AppState>,
    Json(raw): Json<Value>,
) -> Result<Json<AckResponse>, HttpApiError> {
    let mut inner = state.inner.lock().await;
    inner.apply_stat_update(&raw).map_err(HttpApiError::from_engine)?;
    Ok(Json(AckResponse::new(true)))
}

#[derive(Debug, Deserialize)]
struct UserMessageEvent {
    message: String,
}

async fn event_user_message(
    State(state): State<AppState>,
    Json(event): Json<UserMessageEvent>,
) -> Result<Json<AckResponse>, HttpApiError> {
    let mut inner = state.inner.lock().await;
    inner
        .note_user_message(&event.message)
        .map_err(HttpApiError::from_engine)?;
    Ok(Json(AckResponse::new(true)))
}

#[derive(Debug, Deserialize)]
struct GenerationEvent {
    #[serde(default)]
    dry_run: bool,
}

async fn event_generation(
    State(state): State<AppState>,
    Json(event): Json<GenerationEvent>,
) -> Result<Json<AckResponse>, HttpApiError> {
    let mut inner = state.inner.lock().await;
    inner
        .begin_generation(event.dry_run)
        .map_err(HttpApiError::from_engine)?;
    Ok(Json(AckResponse::new(true)))
}

async fn event_chat_changed(
    State(state): State<AppState>,
) -> Result<Json<AckResponse>, HttpApiError> {
    let mut inner = state.inner.lock().await;
    inner.chat_changed().map_err(HttpApiError::from_engine)?;
    Ok(Json(AckResponse::new(true)))
}
