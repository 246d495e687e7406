#[derive(Clone)]
struct AppState {
    // One writer at a time: every operation is a full read-modify-write
    // cycle against the shared blob and the shared currency balance, so the
    // lock is the serialization discipline, not an optimization.
    inner: std::sync::Arc<Mutex<EngineApi>>,
}

impl AppState {
    fn new(api: EngineApi) -> Self {
        Self {
            inner: std::sync::Arc::new(Mutex::new(api)),
        }
    }
}

fn parse_slot(raw: Option<&str>) -> Result<Option<PartySlot>, HttpApiError> {
    let Some(label) = raw.map(str::trim).filter(|label| !label.is_empty()) else {
        return Ok(None);
    };
    match PartySlot::from_label(label) {
        Some(slot) => Ok(Some(slot)),
        None => Err(HttpApiError::invalid_request(
            "slot must be one of Slot1, Slot2, Slot3",
            Some(format!("slot={label}")),
        )),
    }
}
