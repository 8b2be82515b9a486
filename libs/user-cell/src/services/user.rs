use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{is_conflict, SupabaseClient};
use shared_models::auth::{Actor, UserLevel};

use crate::models::{
    AdminUpdateUserRequest, DoctorSearchQuery, DoctorSpecialization, RegisterRequest,
    SpecializationRequest, UserError, UserProfile, VerifyDoctorsRequest,
};
use crate::policy::{self, FieldPolicy};
use crate::validation::{validate_name, validate_specialization};

const TABLE: &str = "users";
const SPECIALIZATIONS: &str = "doctor_specializations";

fn contains_filter(column: &str, value: &str) -> String {
    format!("{}=ilike.*{}*", column, urlencoding::encode(value))
}

fn id_list(ids: &[Uuid]) -> String {
    ids.iter().map(Uuid::to_string).collect::<Vec<_>>().join(",")
}

fn level_list(levels: &[UserLevel]) -> String {
    levels
        .iter()
        .map(|level| i16::from(*level).to_string())
        .collect::<Vec<_>>()
        .join(",")
}

pub struct UserService {
    supabase: SupabaseClient,
}

impl UserService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Self-service sign-up for patients and doctors. Doctors start inactive
    /// until staff verify them.
    pub async fn register(&self, level: UserLevel, request: RegisterRequest) -> Result<UserProfile, UserError> {
        if level.is_staff() {
            return Err(UserError::Forbidden(format!("Cannot self-register as {}", level)));
        }
        request.validate()?;

        let flags = policy::derive_flags(level);
        let row = json!({
            "id": Uuid::new_v4(),
            "username": request.username,
            "first_name": request.first_name,
            "last_name": request.last_name,
            "email": request.email,
            "phone": request.phone,
            "user_level": level,
            "is_active": level != UserLevel::Doctor,
            "is_staff": flags.is_staff,
            "is_superuser": flags.is_superuser,
        });

        let user: UserProfile = self.supabase
            .insert_anonymous(TABLE, row)
            .await
            .map_err(|e| {
                if is_conflict(&e) {
                    UserError::UsernameTaken(request.username.clone())
                } else {
                    UserError::Database(e.to_string())
                }
            })?;

        info!("Registered {} {} ({})", level, user.username, user.id);
        Ok(user)
    }

    pub async fn get_user(&self, user_id: Uuid, auth_token: &str) -> Result<UserProfile, UserError> {
        let rows: Vec<UserProfile> = self.supabase
            .select(TABLE, &format!("id=eq.{}", user_id), auth_token)
            .await
            .map_err(|e| UserError::Database(e.to_string()))?;

        rows.into_iter().next().ok_or(UserError::NotFound)
    }

    pub async fn list_users(&self, actor: &Actor, auth_token: &str) -> Result<Vec<UserProfile>, UserError> {
        let levels = policy::visible_levels(actor);
        if levels.is_empty() {
            return Err(UserError::Forbidden("Not allowed to list users".to_string()));
        }

        let filters = format!("user_level=in.({})&order=username.asc", level_list(&levels));
        self.supabase
            .select(TABLE, &filters, auth_token)
            .await
            .map_err(|e| UserError::Database(e.to_string()))
    }

    async fn load_changeable(&self, actor: &Actor, user_id: Uuid, auth_token: &str) -> Result<UserProfile, UserError> {
        let target = self.get_user(user_id, auth_token).await?;
        if !policy::can_change(actor, target.user_level) {
            warn!("User {} denied access to user {}", actor.id, user_id);
            return Err(UserError::Forbidden("You cannot manage this user".to_string()));
        }
        Ok(target)
    }

    pub async fn field_policy(&self, actor: &Actor, user_id: Uuid, auth_token: &str) -> Result<FieldPolicy, UserError> {
        let target = self.load_changeable(actor, user_id, auth_token).await?;
        Ok(policy::user_field_policy(actor, &target))
    }

    pub async fn admin_update_user(
        &self,
        actor: &Actor,
        user_id: Uuid,
        request: AdminUpdateUserRequest,
        auth_token: &str,
    ) -> Result<UserProfile, UserError> {
        if request.is_empty() {
            return Err(UserError::Validation("No fields to update".to_string()));
        }

        let target = self.load_changeable(actor, user_id, auth_token).await?;
        let field_policy = policy::user_field_policy(actor, &target);
        policy::check_update(&field_policy, &target, &request)?;

        let mut patch = Map::new();
        if let Some(first_name) = request.first_name {
            validate_name("First name", &first_name)?;
            patch.insert("first_name".to_string(), json!(first_name));
        }
        if let Some(last_name) = request.last_name {
            validate_name("Last name", &last_name)?;
            patch.insert("last_name".to_string(), json!(last_name));
        }
        if let Some(email) = request.email {
            patch.insert("email".to_string(), json!(email));
        }
        if let Some(phone) = request.phone {
            patch.insert("phone".to_string(), json!(phone));
        }
        if let Some(is_active) = request.is_active {
            patch.insert("is_active".to_string(), json!(is_active));
        }

        let level = request.user_level.unwrap_or(target.user_level);
        let flags = policy::derive_flags(level);
        patch.insert("user_level".to_string(), json!(level));
        patch.insert("is_staff".to_string(), json!(flags.is_staff));
        patch.insert("is_superuser".to_string(), json!(flags.is_superuser));

        debug!("User {} updating user {}", actor.id, user_id);

        let rows: Vec<UserProfile> = self.supabase
            .update(TABLE, &format!("id=eq.{}", user_id), Value::Object(patch), auth_token)
            .await
            .map_err(|e| UserError::Database(e.to_string()))?;

        rows.into_iter().next().ok_or(UserError::NotFound)
    }

    pub async fn delete_user(&self, actor: &Actor, user_id: Uuid, auth_token: &str) -> Result<(), UserError> {
        let target = self.get_user(user_id, auth_token).await?;
        if !policy::can_delete(actor, target.user_level) {
            return Err(UserError::Forbidden("You cannot delete this user".to_string()));
        }

        self.supabase
            .delete(TABLE, &format!("id=eq.{}", user_id), auth_token)
            .await
            .map_err(|e| UserError::Database(e.to_string()))?;

        info!("User {} deleted by {}", user_id, actor.id);
        Ok(())
    }

    /// Bulk toggle of doctor accounts. Ids of non-doctors are skipped by the
    /// level filter.
    pub async fn verify_doctors(
        &self,
        actor: &Actor,
        request: VerifyDoctorsRequest,
        auth_token: &str,
    ) -> Result<Vec<UserProfile>, UserError> {
        if !actor.is_staff() {
            return Err(UserError::Forbidden("Only staff can verify doctors".to_string()));
        }
        if request.doctor_ids.is_empty() {
            return Err(UserError::Validation("doctor_ids must not be empty".to_string()));
        }

        let filters = format!(
            "id=in.({})&user_level=eq.{}",
            id_list(&request.doctor_ids),
            i16::from(UserLevel::Doctor)
        );
        let rows: Vec<UserProfile> = self.supabase
            .update(TABLE, &filters, json!({ "is_active": request.is_active }), auth_token)
            .await
            .map_err(|e| UserError::Database(e.to_string()))?;

        info!("{} doctors set is_active={} by {}", rows.len(), request.is_active, actor.id);
        Ok(rows)
    }

    async fn doctors_with_specialization(&self, specialization: &str, auth_token: &str) -> Result<Vec<Uuid>, UserError> {
        let rows: Vec<DoctorSpecialization> = self.supabase
            .select(SPECIALIZATIONS, &contains_filter("specialization", specialization), auth_token)
            .await
            .map_err(|e| UserError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(|row| row.doctor_id).collect())
    }

    /// Case-insensitive contains on names, username, email and
    /// specialization; exact match on phone.
    pub async fn search_doctors(&self, query: DoctorSearchQuery, auth_token: &str) -> Result<Vec<UserProfile>, UserError> {
        let query = query.normalized();
        if query.is_empty() {
            return Err(UserError::Validation("Provide at least one search parameter".to_string()));
        }

        let mut parts = vec![
            format!("user_level=eq.{}", i16::from(UserLevel::Doctor)),
            "is_active=eq.true".to_string(),
        ];

        if let Some(first_name) = &query.first_name {
            validate_name("First name", first_name)?;
            parts.push(contains_filter("first_name", first_name));
        }
        if let Some(last_name) = &query.last_name {
            validate_name("Last name", last_name)?;
            parts.push(contains_filter("last_name", last_name));
        }
        if let Some(username) = &query.username {
            parts.push(contains_filter("username", username));
        }
        if let Some(email) = &query.email {
            parts.push(contains_filter("email", email));
        }
        if let Some(phone) = &query.phone {
            parts.push(format!("phone=eq.{}", urlencoding::encode(phone)));
        }
        if let Some(specialization) = &query.specialization {
            validate_specialization(specialization)?;
            let ids = self.doctors_with_specialization(specialization, auth_token).await?;
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            parts.push(format!("id=in.({})", id_list(&ids)));
        }

        parts.push("order=last_name.asc".to_string());
        debug!("Doctor search: {}", parts.join("&"));

        self.supabase
            .select(TABLE, &parts.join("&"), auth_token)
            .await
            .map_err(|e| UserError::Database(e.to_string()))
    }

    pub async fn update_specialization(
        &self,
        actor: &Actor,
        doctor_id: Uuid,
        request: SpecializationRequest,
        auth_token: &str,
    ) -> Result<DoctorSpecialization, UserError> {
        if !actor.is_doctor() || actor.id != doctor_id {
            return Err(UserError::Forbidden("Only the doctor can change their specialization".to_string()));
        }
        let specialization = request.specialization.trim();
        validate_specialization(specialization)?;

        let row = json!({ "doctor_id": doctor_id, "specialization": specialization });
        self.supabase
            .upsert(SPECIALIZATIONS, "doctor_id", row, auth_token)
            .await
            .map_err(|e| UserError::Database(e.to_string()))
    }
}
