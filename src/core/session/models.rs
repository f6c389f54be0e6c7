use serde::{Deserialize, Serialize};

/// Profile fields attached to a session. Depending on which API version
/// issued the session they appear either flat on the blob or nested under
/// `user`, so every field is optional and both spellings are accepted.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SessionUser {
    #[serde(
        rename = "firstName",
        alias = "first_name",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub first_name: Option<String>,
    #[serde(
        rename = "lastName",
        alias = "last_name",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits: Option<i64>,
    #[serde(
        rename = "profileImage",
        alias = "profile_image",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub profile_image: Option<String>,
    #[serde(
        rename = "workRole",
        alias = "work_role",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub work_role: Option<String>,
    #[serde(
        rename = "companyName",
        alias = "company_name",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub company_name: Option<String>,
}

/// The persisted record of the authenticated actor. Only the bearer token
/// is mandatory; a blob without it fails to parse and degrades to
/// logged-out at initialization.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Session {
    #[serde(rename = "accessToken", alias = "access_token")]
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,
    #[serde(flatten)]
    pub profile: SessionUser,
}

impl Session {
    pub fn new(access_token: String) -> Self {
        Self {
            access_token,
            user: None,
            profile: SessionUser::default(),
        }
    }

    /// Nested shape wins over the flat one when both are present.
    pub fn first_name(&self) -> Option<String> {
        self.user
            .as_ref()
            .and_then(|u| u.first_name.to_owned())
            .or_else(|| self.profile.first_name.to_owned())
    }

    pub fn email(&self) -> Option<String> {
        self.user
            .as_ref()
            .and_then(|u| u.email.to_owned())
            .or_else(|| self.profile.email.to_owned())
    }

    pub fn credits(&self) -> Option<i64> {
        self.user
            .as_ref()
            .and_then(|u| u.credits)
            .or(self.profile.credits)
    }

    pub fn profile_image(&self) -> Option<String> {
        self.user
            .as_ref()
            .and_then(|u| u.profile_image.to_owned())
            .or_else(|| self.profile.profile_image.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::Session;

    #[test]
    fn deserialize_flat_session() {
        let blob = r#"{
            "accessToken": "tok123",
            "firstName": "Ann",
            "credits": 5
        }"#;

        let session: Session = serde_json::from_str(blob).unwrap();

        assert_eq!("tok123", session.access_token);
        assert_eq!(Some("Ann".to_string()), session.first_name());
        assert_eq!(Some(5), session.credits());
    }

    #[test]
    fn deserialize_nested_session() {
        let blob = r#"{
            "access_token": "tok456",
            "user": { "firstName": "Bob", "email": "bob@example.com" }
        }"#;

        let session: Session = serde_json::from_str(blob).unwrap();

        assert_eq!("tok456", session.access_token);
        assert_eq!(Some("Bob".to_string()), session.first_name());
        assert_eq!(Some("bob@example.com".to_string()), session.email());
    }

    #[test]
    fn nested_fields_win_over_flat_ones() {
        let blob = r#"{
            "accessToken": "tok789",
            "credits": 1,
            "user": { "credits": 42 }
        }"#;

        let session: Session = serde_json::from_str(blob).unwrap();

        assert_eq!(Some(42), session.credits());
    }

    #[test]
    fn session_without_token_does_not_parse() {
        let blob = r#"{ "firstName": "Ann" }"#;

        assert!(serde_json::from_str::<Session>(blob).is_err());
    }
}
