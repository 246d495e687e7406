#[derive(Debug, Deserialize)]
struct SetCsvUrlRequest {
    url: String,
}

async fn set_pool_csv_url(
    State(state): State<AppState>,
    Json(request): Json<SetCsvUrlRequest>,
) -> Result<Json<AckResponse>, HttpApiError> {
    let mut inner = state.inner.lock().await;
    inner
        .set_pool_csv_url(&request.url)
        .map_err(HttpApiError::from_engine)?;
    Ok(Json(AckResponse::new(true)))
}

#[derive(Debug, Serialize)]
struct RefreshPoolResponse {
    schema_version: String,
    result: PoolRefreshResult,
}

async fn refresh_pool(
    State(state): State<AppState>,
) -> Result<Json<RefreshPoolResponse>, HttpApiError> {
    let mut inner = state.inner.lock().await;
    let result = inner
        .refresh_pool_from_csv()
        .await
        .map_err(HttpApiError::from_engine)?;
    Ok(Json(RefreshPoolResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        result,
    }))
}

#[derive(Debug, Deserialize)]
struct DrawRequest {
    kind: DrawKind,
}

async fn draw_gacha(
    State(state): State<AppState>,
    Json(request): Json<DrawRequest>,
) -> Result<Json<DrawResponse>, HttpApiError> {
    let mut inner = state.inner.lock().await;
    let result = inner
        .draw_gacha(request.kind)
        .map_err(HttpApiError::from_engine)?;
    Ok(Json(DrawResponse::new(result)))
}

#[derive(Debug, Deserialize)]
struct PickupRequest {
    name: String,
}

async fn pickup_by_name(
    State(state): State<AppState>,
    Json(request): Json<PickupRequest>,
) -> Result<Json<DrawResponse>, HttpApiError> {
    let mut inner = state.inner.lock().await;
    let result = inner
        .pickup_by_name(&request.name)
        .map_err(HttpApiError::from_engine)?;
    Ok(Json(DrawResponse::new(result)))
}

#[derive(Debug, Deserialize)]
struct GrantSdpRequest {
    amount: i64,
}

#[derive(Debug, Serialize)]
struct GrantSdpResponse {
    schema_version: String,
    balance: i64,
}

async fn grant_sdp(
    State(state): State<AppState>,
    Json(request): Json<GrantSdpRequest>,
) -> Result<Json<GrantSdpResponse>, HttpApiError> {
    let mut inner = state.inner.lock().await;
    let balance = inner
        .grant_sdp(request.amount)
        .map_err(HttpApiError::from_engine)?;
    Ok(Json(GrantSdpResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        balance,
    }))
}
