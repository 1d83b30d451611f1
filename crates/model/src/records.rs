use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The role of a user account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    /// A student who enrolls in courses.
    Student,
    /// A faculty member who teaches courses.
    Faculty,
    /// An administrator.
    Admin,
}

/// Where a student is with an enrolled course.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnrollmentStatus {
    /// Enrolled but not started.
    Enrolled,
    /// The course has been completed.
    Completed,
    /// The course is being taken right now.
    #[serde(rename = "In Progress")]
    InProgress,
}

/// A course offer as the backend describes it.
///
/// Only the identifier is interpreted by this client. Every other field
/// the backend sends is kept verbatim, so it can be handed back to the
/// advisor without loss.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseOffer {
    /// The unique identifier of this offer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_offer_id: Option<String>,
    /// Remaining fields of the offer.
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// A course in a student's enrollment list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    /// The enrolled course offer.
    pub course_offer: CourseOffer,
    /// Status of the enrollment.
    pub enrollment_status: EnrollmentStatus,
}

/// The profile of the signed-in user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Email address, which is also the login name.
    pub email: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Account role.
    pub role: UserRole,
    /// Courses the user is (or was) enrolled in.
    #[serde(default)]
    pub enrolled_courses: Vec<Enrollment>,
    /// Courses the user teaches.
    #[serde(default)]
    pub courses_taught: Vec<CourseOffer>,
    /// Remaining fields of the profile, such as `_id`.
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// What the advisor needs to know about the user and the catalog.
///
/// The context is owned by the chat session and only read when a request
/// is built, there is no shared global store behind it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisorContext {
    /// The signed-in user, if known.
    #[serde(default)]
    pub user_profile: Option<UserProfile>,
    /// The course offers currently available.
    #[serde(default)]
    pub courses: Vec<CourseOffer>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_profile_wire_names() {
        let profile: UserProfile = serde_json::from_value(json!({
            "email": "ada@example.edu",
            "firstName": "Ada",
            "lastName": "Lovelace",
            "role": "Student",
            "enrolledCourses": [{
                "courseOffer": { "courseOfferId": "CS101", "term": "Fall" },
                "enrollmentStatus": "In Progress"
            }],
            "coursesTaught": []
        }))
        .unwrap();
        assert_eq!(profile.first_name, "Ada");
        assert_eq!(profile.role, UserRole::Student);

        let enrollment = &profile.enrolled_courses[0];
        assert_eq!(enrollment.enrollment_status, EnrollmentStatus::InProgress);
        assert_eq!(
            enrollment.course_offer.course_offer_id.as_deref(),
            Some("CS101")
        );
        assert_eq!(enrollment.course_offer.details["term"], json!("Fall"));

        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(
            value["enrolledCourses"][0]["enrollmentStatus"],
            json!("In Progress")
        );
        assert_eq!(
            value["enrolledCourses"][0]["courseOffer"]["term"],
            json!("Fall")
        );
    }

    #[test]
    fn test_profile_keeps_backend_fields() {
        let source = json!({
            "_id": "u42",
            "email": "ada@example.edu",
            "firstName": "Ada",
            "lastName": "Lovelace",
            "role": "Student",
            "profileImage": "ada.png",
            "enrolledCourses": [],
            "coursesTaught": [],
            "createdAt": "2024-01-01T00:00:00.000Z",
            "updatedAt": "2024-02-01T00:00:00.000Z",
            "__v": 0
        });
        let profile: UserProfile =
            serde_json::from_value(source.clone()).unwrap();
        assert_eq!(profile.details["_id"], json!("u42"));
        assert!(!profile.details.contains_key("email"));

        assert_eq!(serde_json::to_value(&profile).unwrap(), source);
    }

    #[test]
    fn test_context_defaults() {
        let ctx: AdvisorContext = serde_json::from_str("{}").unwrap();
        assert_eq!(ctx, AdvisorContext::default());
    }
}
