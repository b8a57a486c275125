//! Persisted progress of the last pipeline run for one base filename.
//!
//! Stored as JSON next to the artifacts (`{base}.progress.json`). Completed
//! stages always form a prefix of `Stage::ALL`.

use certforge_core::models::BaseFilename;
use certforge_core::{CertificateResult, NotificationStatus, ShortLink};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;

use super::error::Stage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressCursor {
    pub base: BaseFilename,
    /// Verification URL of the run; a different identifier starts over.
    pub verify_url: String,
    pub completed: Vec<Stage>,
    /// Link embedded by the last completed render.
    pub short_link: Option<ShortLink>,
    pub notification: Option<NotificationStatus>,
    pub updated_at: DateTime<Utc>,
}

impl ProgressCursor {
    pub fn new(base: BaseFilename, verify_url: impl Into<String>) -> Self {
        Self {
            base,
            verify_url: verify_url.into(),
            completed: Vec::new(),
            short_link: None,
            notification: None,
            updated_at: Utc::now(),
        }
    }

    pub fn is_done(&self, stage: Stage) -> bool {
        self.completed.contains(&stage)
    }

    pub fn is_complete(&self) -> bool {
        Stage::ALL.iter().all(|s| self.is_done(*s))
    }

    /// Record `stage` as done, forgetting anything recorded after it.
    pub fn complete(&mut self, stage: Stage) {
        self.reset_from(stage);
        self.completed.push(stage);
        self.updated_at = Utc::now();
    }

    /// Forget `stage` and every later stage.
    pub fn reset_from(&mut self, stage: Stage) {
        self.completed.retain(|s| *s < stage);
        if stage <= Stage::Render {
            self.short_link = None;
        }
        self.notification = None;
    }

    /// Load a cursor. A missing file is `None`; so is an unreadable one,
    /// which only costs a full re-run.
    pub async fn load(path: &Path) -> CertificateResult<Option<Self>> {
        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice(&raw) {
            Ok(cursor) => Ok(Some(cursor)),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %path.display(),
                    "Ignoring unreadable progress cursor"
                );
                Ok(None)
            }
        }
    }

    /// Write through a temporary file so readers never see a torn cursor.
    pub async fn save(&self, path: &Path) -> CertificateResult<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}
