#[derive(Debug, Serialize)]
struct SnapshotResponse {
    schema_version: String,
    snapshot: RosterSnapshot,
}

async fn get_snapshot(
    State(state): State<AppState>,
) -> Result<Json<SnapshotResponse>, HttpApiError> {
    let mut inner = state.inner.lock().await;
    let snapshot = inner.snapshot().map_err(HttpApiError::from_engine)?;
    Ok(Json(SnapshotResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        snapshot,
    }))
}

#[derive(Debug, Serialize)]
struct AckResponse {
    schema_version: String,
    ok: bool,
}

impl AckResponse {
    fn new(ok: bool) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            ok,
        }
    }
}

async fn sync_now(State(state): State<AppState>) -> Result<Json<AckResponse>, HttpApiError> {
    let mut inner = state.inner.lock().await;
    inner.sync_now().map_err(HttpApiError::from_engine)?;
    Ok(Json(AckResponse::new(true)))
}

#[derive(Debug, Serialize)]
struct DrawResponse {
    schema_version: String,
    result: DrawResult,
}

impl DrawResponse {
    fn new(result: DrawResult) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            result,
        }
    }
}

async fn register_custom_partner(
    State(state): State<AppState>,
    Json(input): Json<NewPartnerInput>,
) -> Result<Json<DrawResponse>, HttpApiError> {
    let mut inner = state.inner.lock().await;
    let result = inner
        .register_custom_partner(&input)
        .map_err(HttpApiError::from_engine)?;
    Ok(Json(DrawResponse::new(result)))
}

#[derive(Debug, Deserialize)]
struct PartyAddRequest {
    partner_id: String,
    slot: Option<String>,
}

async fn add_to_party(
    State(state): State<AppState>,
    Json(request): Json<PartyAddRequest>,
) -> Result<Json<AckResponse>, HttpApiError> {
    let slot = parse_slot(request.slot.as_deref())?;
    let mut inner = state.inner.lock().await;
    let ok = inner
        .add_partner_to_party(&request.partner_id, slot)
        .map_err(HttpApiError::from_engine)?;
    Ok(Json(AckResponse::new(ok)))
}

#[derive(Debug, Deserialize)]
struct PartyRemoveRequest {
    target: String,
}

async fn remove_from_party(
    State(state): State<AppState>,
    Json(request): Json<PartyRemoveRequest>,
) -> Result<Json<AckResponse>, HttpApiError> {
    let mut inner = state.inner.lock().await;
    let ok = inner
        .remove_partner_from_party(&request.target)
        .map_err(HttpApiError::from_engine)?;
    Ok(Json(AckResponse::new(ok)))
}

#[derive(Debug, Deserialize)]
struct QueueBriefRequest {
    partner_id: String,
}

async fn queue_brief_profile(
    State(state): State<AppState>,
    Json(request): Json<QueueBriefRequest>,
) -> Result<Json<AckResponse>, HttpApiError> {
    let mut inner = state.inner.lock().await;
    inner
        .queue_brief_profile(&request.partner_id)
        .map_err(HttpApiError::from_engine)?;
    Ok(Json(AckResponse::new(true)))
}

#[derive(Debug, Serialize)]
struct DrainPromptsResponse {
    schema_version: String,
    prompts: Vec<InjectionPrompt>,
}

async fn drain_prompts(
    State(state): State<AppState>,
) -> Result<Json<DrainPromptsResponse>, HttpApiError> {
    let mut inner = state.inner.lock().await;
    let prompts = inner
        .drain_pending_prompts()
        .map_err(HttpApiError::from_persistence)?;
    Ok(Json(DrainPromptsResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        prompts,
    }))
}
