use std::cell::RefCell;

use serde::Serialize;
use timeline_overlays_core::{
    AnnotationModified, CommandRecorder, EntryRecord, LabelCommit, Overlay, OverlayConfig,
    OverlayPatch, Overlays, PaneDimensions, PaneId, ReconcileStats, TableProvider, TimeWindow,
    parse_scenario,
};
use timeline_overlays_protocol::{NodeCommand, OverlayId, OverlayKind};
use wasm_bindgen::prelude::*;

type Engine = Overlays<TableProvider, CommandRecorder>;

thread_local! {
    static ENGINES: RefCell<Vec<Option<Engine>>> = const { RefCell::new(Vec::new()) };
}

fn register(engine: Engine) -> usize {
    ENGINES.with_borrow_mut(|engines| {
        engines.push(Some(engine));
        engines.len() - 1
    })
}

fn with_engine<T>(
    handle: usize,
    f: impl FnOnce(&mut Engine) -> Result<T, JsError>,
) -> Result<T, JsError> {
    ENGINES.with_borrow_mut(|engines| {
        let engine = engines
            .get_mut(handle)
            .and_then(Option::as_mut)
            .ok_or_else(|| JsError::new("invalid engine handle"))?;
        f(engine)
    })
}

fn parse_pane(pane: &str) -> Result<PaneId, JsError> {
    match pane {
        "main" => Ok(PaneId::Main),
        "network" => Ok(PaneId::Network),
        _ => Err(JsError::new(&format!("unknown pane: {pane}"))),
    }
}

#[derive(Serialize)]
struct UpdateResult {
    stats: ReconcileStats,
    commands: Vec<NodeCommand>,
}

/// Create an empty engine from a JSON config (`"{}"` for defaults). Returns a
/// handle for the other calls.
#[wasm_bindgen]
pub fn create_engine(config_json: &str) -> Result<usize, JsError> {
    let config = OverlayConfig::from_json(config_json)?;
    Ok(register(Overlays::new(
        TableProvider::default(),
        CommandRecorder::new(),
        config,
    )))
}

/// Create an engine from a whole scenario document.
#[wasm_bindgen]
pub fn load_scenario(data: &[u8]) -> Result<usize, JsError> {
    let engine = parse_scenario(data)?.build(CommandRecorder::new())?;
    Ok(register(engine))
}

/// Drop an engine. Its handle is not reused.
#[wasm_bindgen]
pub fn destroy_engine(handle: usize) -> Result<(), JsError> {
    ENGINES.with_borrow_mut(|engines| match engines.get_mut(handle) {
        Some(slot @ Some(_)) => {
            *slot = None;
            Ok(())
        }
        _ => Err(JsError::new("invalid engine handle")),
    })
}

/// Insert or replace entries, given as a JSON array of entry records.
#[wasm_bindgen]
pub fn upsert_entries(handle: usize, entries_json: &str) -> Result<usize, JsError> {
    let records: Vec<EntryRecord> = serde_json::from_str(entries_json)?;
    with_engine(handle, |engine| {
        let count = records.len();
        for record in records {
            engine.provider_mut().insert(record);
        }
        Ok(count)
    })
}

#[wasm_bindgen]
pub fn update_chart_dimensions(handle: usize, pane: &str, dims_json: &str) -> Result<(), JsError> {
    let pane = parse_pane(pane)?;
    let dims: PaneDimensions = serde_json::from_str(dims_json)?;
    with_engine(handle, |engine| Ok(engine.update_chart_dimensions(pane, dims)?))
}

#[wasm_bindgen]
pub fn update_visible_window(handle: usize, min: f64, max: f64) -> Result<(), JsError> {
    let window = TimeWindow::new(min, max)?;
    with_engine(handle, |engine| {
        engine.update_visible_window(window);
        Ok(())
    })
}

/// Register an overlay given as JSON. Returns its id.
#[wasm_bindgen]
pub fn add_overlay(handle: usize, overlay_json: &str) -> Result<u64, JsError> {
    let overlay: Overlay<u64> = serde_json::from_str(overlay_json)?;
    with_engine(handle, |engine| Ok(engine.add(overlay)?.get()))
}

#[wasm_bindgen]
pub fn update_overlay(handle: usize, id: u64, patch_json: &str) -> Result<(), JsError> {
    let patch: OverlayPatch<u64> = serde_json::from_str(patch_json)?;
    with_engine(handle, |engine| {
        Ok(engine.update_existing(OverlayId::from_raw(id), patch)?)
    })
}

/// Remove an overlay. Returns the removed overlay as JSON.
#[wasm_bindgen]
pub fn remove_overlay(handle: usize, id: u64) -> Result<String, JsError> {
    with_engine(handle, |engine| {
        let overlay = engine.remove(OverlayId::from_raw(id))?;
        Ok(serde_json::to_string(&overlay)?)
    })
}

/// `kind` is the wire name, e.g. `"ENTRY_SELECTED"`.
#[wasm_bindgen]
pub fn remove_overlays_of_type(handle: usize, kind: &str) -> Result<usize, JsError> {
    let kind: OverlayKind = kind.parse()?;
    with_engine(handle, |engine| Ok(engine.remove_overlays_of_type(kind)))
}

/// Reconcile nodes. Returns `{stats, commands}` where `commands` holds every
/// node command recorded since the previous call, including teardown done by
/// removals.
#[wasm_bindgen]
pub fn update(handle: usize) -> Result<String, JsError> {
    with_engine(handle, |engine| {
        let stats = engine.update()?;
        let commands = engine.backend_mut().drain();
        Ok(serde_json::to_string(&UpdateResult { stats, commands })?)
    })
}

/// Ids of the overlays anchored to `entry`, as a JSON array.
#[wasm_bindgen]
pub fn overlays_for_entry(handle: usize, entry: u64) -> Result<String, JsError> {
    with_engine(handle, |engine| {
        let ids: Vec<OverlayId> = engine
            .overlays_for_entry(&entry)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        Ok(serde_json::to_string(&ids)?)
    })
}

#[wasm_bindgen]
pub fn x_pixel_for_event_on_chart(handle: usize, entry: u64) -> Result<f64, JsError> {
    with_engine(handle, |engine| Ok(engine.x_pixel_for_event_on_chart(&entry)?))
}

/// `undefined` when the entry's level is hidden.
#[wasm_bindgen]
pub fn y_pixel_for_event_on_chart(handle: usize, entry: u64) -> Result<Option<f64>, JsError> {
    with_engine(handle, |engine| Ok(engine.y_pixel_for_event_on_chart(&entry)?))
}

#[wasm_bindgen]
pub fn begin_label_edit(handle: usize, id: u64) -> Result<(), JsError> {
    with_engine(handle, |engine| {
        Ok(engine.begin_label_edit(OverlayId::from_raw(id))?)
    })
}

#[wasm_bindgen]
pub fn set_label_text(handle: usize, id: u64, text: &str) -> Result<(), JsError> {
    with_engine(handle, |engine| {
        Ok(engine.set_label_text(OverlayId::from_raw(id), text)?)
    })
}

/// Returns `true` if the label was kept, `false` if it was dropped.
#[wasm_bindgen]
pub fn commit_label(handle: usize, id: u64) -> Result<bool, JsError> {
    with_engine(handle, |engine| {
        Ok(engine.commit_label(OverlayId::from_raw(id))? == LabelCommit::Kept)
    })
}

/// The annotations manager created an annotation. Returns the overlay id.
#[wasm_bindgen]
pub fn annotation_added(handle: usize, overlay_json: &str) -> Result<Option<u64>, JsError> {
    let overlay: Overlay<u64> = serde_json::from_str(overlay_json)?;
    with_engine(handle, |engine| {
        let id = engine.handle_annotation_event(AnnotationModified::Added(overlay))?;
        Ok(id.map(OverlayId::get))
    })
}

#[wasm_bindgen]
pub fn annotation_removed(handle: usize, id: u64) -> Result<(), JsError> {
    with_engine(handle, |engine| {
        engine.handle_annotation_event(AnnotationModified::Removed(OverlayId::from_raw(id)))?;
        Ok(())
    })
}

/// User actions on annotation overlays since the previous call, as JSON.
#[wasm_bindgen]
pub fn drain_annotation_actions(handle: usize) -> Result<String, JsError> {
    with_engine(handle, |engine| {
        Ok(serde_json::to_string(&engine.events().drain())?)
    })
}
