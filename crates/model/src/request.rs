use serde::{Deserialize, Serialize};

use crate::AdvisorContext;

/// A request to be sent to the advisor's chat endpoint.
///
/// The backend expects the profile and the course list as JSON-encoded
/// strings rather than nested objects.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// What the user typed.
    pub user_input: String,
    /// The user profile, encoded as JSON text.
    pub user_profile: String,
    /// The available course offers, encoded as JSON text.
    pub courses: String,
}

impl ChatRequest {
    /// Creates a request for `user_input` with the given context.
    pub fn new<S: Into<String>>(user_input: S, ctx: &AdvisorContext) -> Self {
        // Serializing these plain data types can't fail.
        let user_profile = serde_json::to_string(&ctx.user_profile)
            .unwrap_or_else(|_| "null".to_owned());
        let courses = serde_json::to_string(&ctx.courses)
            .unwrap_or_else(|_| "[]".to_owned());
        Self {
            user_input: user_input.into(),
            user_profile,
            courses,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, json};

    use super::*;
    use crate::CourseOffer;

    #[test]
    fn test_request_payload() {
        let ctx = AdvisorContext {
            user_profile: None,
            courses: vec![CourseOffer {
                course_offer_id: Some("CS5500".to_owned()),
                details: Map::new(),
            }],
        };
        let req = ChatRequest::new("Which course next?", &ctx);
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "userInput": "Which course next?",
                "userProfile": "null",
                "courses": "[{\"courseOfferId\":\"CS5500\"}]"
            })
        );
    }

    #[test]
    fn test_request_keeps_profile_identity() {
        let ctx: AdvisorContext = serde_json::from_value(json!({
            "userProfile": {
                "_id": "u42",
                "email": "a@b.c",
                "firstName": "A",
                "lastName": "B",
                "role": "Student",
                "profileImage": "x.png",
                "createdAt": "2024"
            }
        }))
        .unwrap();
        let req = ChatRequest::new("Hi", &ctx);

        let sent: serde_json::Value =
            serde_json::from_str(&req.user_profile).unwrap();
        assert_eq!(sent["_id"], json!("u42"));
        assert_eq!(sent["profileImage"], json!("x.png"));
        assert_eq!(sent["createdAt"], json!("2024"));
        assert_eq!(sent["firstName"], json!("A"));
    }
}
