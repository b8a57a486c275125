use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Read-only view of a certificate record.
///
/// Student, delivery and course records are owned elsewhere; generation only
/// reads these fields. An accessor returning `None` means the record lacks
/// that field and extraction fails with a lookup error.
pub trait CertificateSource: Send + Sync {
    fn student_full_name(&self) -> Option<&str>;
    fn student_email(&self) -> Option<&str>;
    fn delivery_start_date(&self) -> Option<NaiveDate>;
    fn course_title(&self) -> Option<&str>;
    fn course_description(&self) -> Option<&str>;
    /// Identifier appended to the verification base URL.
    fn identifier(&self) -> Option<&str>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub full_name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub start_date: NaiveDate,
    pub course: Course,
}

/// Concrete certificate record, e.g. deserialized from a JSON request file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRequest {
    pub student: Student,
    pub delivery: Delivery,
    pub identifier: String,
}

impl CertificateSource for CertificateRequest {
    fn student_full_name(&self) -> Option<&str> {
        Some(&self.student.full_name)
    }

    fn student_email(&self) -> Option<&str> {
        Some(&self.student.email)
    }

    fn delivery_start_date(&self) -> Option<NaiveDate> {
        Some(self.delivery.start_date)
    }

    fn course_title(&self) -> Option<&str> {
        Some(&self.delivery.course.title)
    }

    fn course_description(&self) -> Option<&str> {
        Some(&self.delivery.course.description)
    }

    fn identifier(&self) -> Option<&str> {
        Some(&self.identifier)
    }
}
