use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Staff,
    Manager,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub username: String,
    /// Argon2 PHC string, never rendered.
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub sex: i32,
    #[serde(default)]
    pub birthday: String,
    #[serde(default, rename = "imgUrl")]
    pub img_url: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub sdt: String,
    #[serde(default = "default_active")]
    pub status: i32,
}

fn default_active() -> i32 {
    1
}

#[derive(Deserialize, Debug, Default)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub sex: Option<i32>,
    pub birthday: Option<String>,
    #[serde(rename = "imgUrl")]
    pub img_url: Option<String>,
    pub role: Option<UserRole>,
    pub email: Option<String>,
    pub sdt: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub sex: String,
    pub birthday: String,
    #[serde(rename = "imgUrl")]
    pub img_url: String,
    pub role: UserRole,
    pub email: String,
    pub sdt: String,
    pub status: i32,
}

fn sex_label(sex: i32) -> &'static str {
    match sex {
        1 => "male",
        2 => "female",
        _ => "other",
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id.to_hex(),
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            sex: sex_label(user.sex).to_string(),
            birthday: user.birthday,
            img_url: user.img_url,
            role: user.role,
            email: user.email,
            sdt: user.sdt,
            status: user.status,
        }
    }
}
