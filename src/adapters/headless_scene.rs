//! Headless scene adapter.
//!
//! Implements [`ScenePort`], [`AudioPort`] and [`CapturePort`] without a
//! renderer: anchors are tracked in memory and every call is logged.  Used by
//! the console binary; a real AR runtime would implement the same traits.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use log::{debug, info, warn};
use serde::Serialize;

use crate::app::ports::{AnchorId, AudioPort, CapturePort, ScenePort};
use crate::assets::EntityHandle;
use crate::error::{AudioError, CaptureError};
use crate::model::Pose;

/// One anchored entity as the headless scene sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneNode {
    pub entity: u64,
    pub model_id: String,
    pub pose: Pose,
    pub scale: f32,
    pub animation: Option<String>,
}

pub struct HeadlessScene {
    nodes: BTreeMap<u64, SceneNode>,
    next_anchor: u64,
    sounds: Vec<String>,
    capture_dir: Option<PathBuf>,
    captures: u32,
}

impl Default for HeadlessScene {
    fn default() -> Self {
        Self::new(None)
    }
}

impl HeadlessScene {
    /// Known sound names; anything else is reported as unknown.
    pub const SOUNDS: [&'static str; 2] = ["eat", "meow"];

    /// Captures are written into `capture_dir` when one is given.
    pub fn new(capture_dir: Option<PathBuf>) -> Self {
        Self {
            nodes: BTreeMap::new(),
            next_anchor: 1,
            sounds: Vec::new(),
            capture_dir,
            captures: 0,
        }
    }

    pub fn node(&self, anchor: AnchorId) -> Option<&SceneNode> {
        self.nodes.get(&anchor.0)
    }

    pub fn anchor_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn sounds_played(&self) -> &[String] {
        &self.sounds
    }
}

impl ScenePort for HeadlessScene {
    fn add_anchor(&mut self, pose: Pose, entity: &EntityHandle) -> AnchorId {
        let anchor = AnchorId(self.next_anchor);
        self.next_anchor += 1;
        self.nodes.insert(
            anchor.0,
            SceneNode {
                entity: entity.id,
                model_id: entity.model_id.clone(),
                pose,
                scale: 1.0,
                animation: None,
            },
        );
        info!(
            "scene: anchor {} <- '{}' at ({:.2}, {:.2}, {:.2})",
            anchor.0, entity.model_id, pose.position[0], pose.position[1], pose.position[2]
        );
        anchor
    }

    fn remove_anchor(&mut self, anchor: AnchorId) {
        if self.nodes.remove(&anchor.0).is_some() {
            info!("scene: anchor {} removed", anchor.0);
        }
    }

    fn set_scale(&mut self, anchor: AnchorId, scale: f32) {
        if let Some(node) = self.nodes.get_mut(&anchor.0) {
            node.scale = scale;
            debug!("scene: anchor {} scale {:.2}", anchor.0, scale);
        }
    }

    fn play_animation(&mut self, anchor: AnchorId, name: &str, duration_ms: u64) {
        if let Some(node) = self.nodes.get_mut(&anchor.0) {
            node.animation = Some(name.to_string());
            info!("scene: anchor {} plays '{}' ({} ms)", anchor.0, name, duration_ms);
        }
    }
}

impl AudioPort for HeadlessScene {
    fn play_sound(&mut self, name: &str) -> Result<(), AudioError> {
        if !Self::SOUNDS.contains(&name) {
            return Err(AudioError::UnknownSound(name.to_string()));
        }
        info!("audio: ♪ {}", name);
        self.sounds.push(name.to_string());
        Ok(())
    }
}

impl CapturePort for HeadlessScene {
    /// Writes the anchored nodes as JSON, which is all a headless frame has.
    fn capture_frame(&mut self) -> Result<String, CaptureError> {
        let Some(dir) = &self.capture_dir else {
            return Err(CaptureError::NoFrame);
        };
        self.captures += 1;
        let path = dir.join(format!("capture-{:03}.json", self.captures));
        let nodes: Vec<&SceneNode> = self.nodes.values().collect();
        let body =
            serde_json::to_vec_pretty(&nodes).map_err(|e| CaptureError::Write(e.to_string()))?;
        fs::create_dir_all(dir)
            .and_then(|()| fs::write(&path, body))
            .map_err(|e| {
                warn!("capture: {} failed: {}", path.display(), e);
                CaptureError::Write(e.to_string())
            })?;
        Ok(path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: u64) -> EntityHandle {
        EntityHandle {
            id,
            model_id: "cat".to_string(),
        }
    }

    #[test]
    fn anchors_are_tracked_and_released() {
        let mut scene = HeadlessScene::default();
        let a = scene.add_anchor(Pose::at(0.0, 0.0, -1.0), &entity(1));
        let b = scene.add_anchor(Pose::at(0.5, 0.0, -1.0), &entity(2));
        assert_ne!(a, b);
        assert_eq!(scene.anchor_count(), 2);

        scene.set_scale(b, 1.5);
        assert_eq!(scene.node(b).unwrap().scale, 1.5);

        scene.remove_anchor(a);
        scene.remove_anchor(a);
        assert_eq!(scene.anchor_count(), 1);
    }

    #[test]
    fn unknown_sound_is_an_error() {
        let mut scene = HeadlessScene::default();
        assert!(scene.play_sound("meow").is_ok());
        assert!(matches!(
            scene.play_sound("bark"),
            Err(AudioError::UnknownSound(_))
        ));
        assert_eq!(scene.sounds_played(), ["meow".to_string()]);
    }

    #[test]
    fn capture_without_output_dir_has_no_frame() {
        let mut scene = HeadlessScene::default();
        assert_eq!(scene.capture_frame(), Err(CaptureError::NoFrame));
    }

    #[test]
    fn capture_writes_numbered_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut scene = HeadlessScene::new(Some(dir.path().to_path_buf()));
        scene.add_anchor(Pose::at(0.0, 0.0, -1.0), &entity(7));

        let first = scene.capture_frame().unwrap();
        let second = scene.capture_frame().unwrap();
        assert!(first.ends_with("capture-001.json"));
        assert!(second.ends_with("capture-002.json"));
        let body = fs::read_to_string(&first).unwrap();
        assert!(body.contains("\"entity\": 7"));
    }
}
