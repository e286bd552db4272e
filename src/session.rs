// ============================================================================
// SESSION STATE — the application's only persisted record
// ============================================================================
//
// A session is a small JSON blob: session id, filename, a signature of the
// original image bytes, and the action stack. It is everything needed to
// reconstruct the current edit (together with the original file) and it keys
// the replay cache. The GUI can export/import it; the CLI replays it
// headlessly.

use std::fs;
use std::path::Path;

use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ops::actions::ActionStack;

/// How many base64 characters of the source bytes make up the signature.
const SIGNATURE_LEN: usize = 200;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: String,
    pub filename: String,
    pub image_signature: String,
    pub action_stack: ActionStack,
}

impl SessionState {
    /// Fresh session for a newly opened document.
    pub fn new(filename: &str, source_bytes: &[u8]) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            filename: filename.to_string(),
            image_signature: signature_of(source_bytes),
            action_stack: ActionStack::new(),
        }
    }

    /// A different image was opened: replace filename and signature and drop
    /// the whole edit history. The session id survives.
    pub fn replace_image(&mut self, filename: &str, source_bytes: &[u8]) {
        self.filename = filename.to_string();
        self.image_signature = signature_of(source_bytes);
        self.action_stack.clear();
    }

    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string_pretty(self).map_err(|e| format!("session encode failed: {}", e))
    }

    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("session parse failed: {}", e))
    }

    pub fn save(&self, path: &Path) -> Result<(), String> {
        let json = self.to_json()?;
        fs::write(path, json).map_err(|e| format!("could not write '{}': {}", path.display(), e))
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let json = fs::read_to_string(path)
            .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;
        Self::from_json(&json)
    }
}

/// First `SIGNATURE_LEN` characters of the base64 encoding of `bytes`.
/// Ties cache entries to image content without storing the image itself.
pub fn signature_of(bytes: &[u8]) -> String {
    let mut b64 = general_purpose::STANDARD.encode(bytes);
    b64.truncate(SIGNATURE_LEN);
    b64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::actions::{Action, FilterKind, Operation};

    #[test]
    fn signature_is_capped_at_200_chars() {
        let long = signature_of(&[7u8; 4096]);
        assert_eq!(long.len(), 200);
        let short = signature_of(b"tiny");
        assert!(short.len() < 200);
        assert_eq!(short, "dGlueQ==");
    }

    #[test]
    fn new_sessions_get_distinct_ids() {
        let a = SessionState::new("a.png", b"aa");
        let b = SessionState::new("a.png", b"aa");
        assert_ne!(a.session_id, b.session_id);
        assert!(Uuid::parse_str(&a.session_id).is_ok());
    }

    #[test]
    fn replacing_the_image_clears_the_stack() {
        let mut session = SessionState::new("a.png", b"aa");
        session.action_stack.push(Action {
            operation: Operation::Filter(FilterKind::Blur),
            selection: None,
        });

        session.replace_image("b.png", b"bb");
        assert_eq!(session.filename, "b.png");
        assert_eq!(session.image_signature, signature_of(b"bb"));
        assert!(session.action_stack.is_empty());
    }

    #[test]
    fn json_round_trip() {
        let mut session = SessionState::new("photo.jpg", b"bytes");
        session.action_stack.push(Action {
            operation: Operation::Filter(FilterKind::Sharpen),
            selection: None,
        });

        let json = session.to_json().unwrap();
        for key in ["session_id", "filename", "image_signature", "action_stack"] {
            assert!(json.contains(key), "missing {}", key);
        }
        assert_eq!(SessionState::from_json(&json).unwrap(), session);
    }

    #[test]
    fn save_and_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let session = SessionState::new("photo.jpg", b"bytes");
        session.save(&path).unwrap();
        assert_eq!(SessionState::load(&path).unwrap(), session);
    }

    #[test]
    fn load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{not json").unwrap();
        assert!(SessionState::load(&path).is_err());
    }
}
