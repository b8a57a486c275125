use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};

/// Flat rendering inputs derived from a certificate record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderDetails {
    pub name: String,
    pub email: String,
    /// Delivery start date in `YYYY-MM-DD` form.
    pub date: String,
    pub course_name: String,
    pub course_desc: String,
    pub verify_url: String,
}

/// Deterministic, filesystem-safe stem shared by every artifact of one
/// certificate.
///
/// Same name, date and course title always give the same value, so a second
/// generation overwrites the first instead of creating a sibling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BaseFilename(String);

impl BaseFilename {
    pub fn from_details(details: &RenderDetails) -> Self {
        let joined = [
            details.name.trim(),
            details.date.trim(),
            details.course_name.trim(),
        ]
        .join("_");

        let mut normalized = String::with_capacity(joined.len());
        let mut in_gap = false;
        for c in joined.chars() {
            if c.is_whitespace() {
                if !in_gap {
                    normalized.push('_');
                }
                in_gap = true;
            } else {
                if c == '/' || c == '\\' {
                    normalized.push('_');
                } else {
                    normalized.extend(c.to_lowercase());
                }
                in_gap = false;
            }
        }

        BaseFilename(normalized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for BaseFilename {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// Storage keys and local paths for one certificate's artifacts.
///
/// Keys are relative and `/`-separated (`pdf/test/{base}.pdf`); the local
/// path of an artifact is its key resolved against the workspace root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub base: BaseFilename,
    pub certificate_key: String,
    pub image_key: String,
    pub certificate_path: PathBuf,
    pub image_path: PathBuf,
    pub progress_path: PathBuf,
}

impl ArtifactPaths {
    pub fn new(workspace_root: &Path, scoped_prefix: &str, base: BaseFilename) -> Self {
        let prefix = scoped_prefix.trim_end_matches('/');
        let certificate_key = format!("{}/{}.pdf", prefix, base);
        let image_key = format!("{}/{}.jpg", prefix, base);
        let progress_key = format!("{}/{}.progress.json", prefix, base);

        ArtifactPaths {
            certificate_path: workspace_root.join(&certificate_key),
            image_path: workspace_root.join(&image_key),
            progress_path: workspace_root.join(progress_key),
            certificate_key,
            image_key,
            base,
        }
    }

    /// Name the rendered document carries when attached to an email.
    pub fn attachment_name(&self) -> String {
        format!("{}.pdf", self.base)
    }

    pub fn keys(&self) -> PublishedArtifactKeys {
        PublishedArtifactKeys {
            certificate_key: self.certificate_key.clone(),
            image_key: self.image_key.clone(),
        }
    }
}

/// Storage keys of the published document and preview image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedArtifactKeys {
    pub certificate_key: String,
    pub image_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(name: &str, date: &str, course: &str) -> RenderDetails {
        RenderDetails {
            name: name.to_string(),
            email: "ada@example.com".to_string(),
            date: date.to_string(),
            course_name: course.to_string(),
            course_desc: "Intro".to_string(),
            verify_url: "http://host/verify/abc123".to_string(),
        }
    }

    #[test]
    fn base_filename_lowercases_and_joins() {
        let base = BaseFilename::from_details(&details("Ada Lovelace", "2024-01-10", "Systems Design"));
        assert_eq!(base.as_str(), "ada_lovelace_2024-01-10_systems_design");
    }

    #[test]
    fn whitespace_runs_collapse_to_one_underscore() {
        let base = BaseFilename::from_details(&details(
            "  Ada \t Lovelace ",
            "2024-01-10",
            "Systems\n\nDesign",
        ));
        assert_eq!(base.as_str(), "ada_lovelace_2024-01-10_systems_design");
    }

    #[test]
    fn path_separators_never_leak_into_the_segment() {
        let base = BaseFilename::from_details(&details("Ada", "2024-01-10", "I/O and C\\C++"));
        assert_eq!(base.as_str(), "ada_2024-01-10_i_o_and_c_c++");
        assert!(!base.as_str().contains('/'));
    }

    #[test]
    fn identical_inputs_give_identical_names() {
        let a = BaseFilename::from_details(&details("Émile Zola", "2024-01-10", "Prose"));
        let mut other = details("Émile Zola", "2024-01-10", "Prose");
        other.email = "someone-else@example.com".to_string();
        other.verify_url = "http://host/verify/zzz".to_string();
        let b = BaseFilename::from_details(&other);
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "émile_zola_2024-01-10_prose");
    }

    #[test]
    fn artifact_keys_mirror_local_paths() {
        let base = BaseFilename::from_details(&details("Ada Lovelace", "2024-01-10", "Systems Design"));
        let paths = ArtifactPaths::new(Path::new("/srv/certs"), "pdf/test/", base);

        assert_eq!(
            paths.certificate_key,
            "pdf/test/ada_lovelace_2024-01-10_systems_design.pdf"
        );
        assert_eq!(
            paths.image_key,
            "pdf/test/ada_lovelace_2024-01-10_systems_design.jpg"
        );
        assert_eq!(
            paths.certificate_path,
            Path::new("/srv/certs/pdf/test/ada_lovelace_2024-01-10_systems_design.pdf")
        );
        assert_eq!(
            paths.attachment_name(),
            "ada_lovelace_2024-01-10_systems_design.pdf"
        );
    }
}
