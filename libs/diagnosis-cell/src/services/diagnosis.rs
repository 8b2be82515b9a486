use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::{Actor, UserLevel};

use crate::models::{AddDiagnosisRequest, Diagnosis, DiagnosisError};

const TABLE: &str = "diagnoses";

pub struct DiagnosisService {
    supabase: SupabaseClient,
}

impl DiagnosisService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn has_visit_with(&self, doctor_id: Uuid, patient_id: Uuid, auth_token: &str) -> Result<bool, DiagnosisError> {
        let filters = format!("doctor_id=eq.{}&patient_id=eq.{}", doctor_id, patient_id);
        self.supabase
            .exists("visits", &filters, auth_token)
            .await
            .map_err(|e| DiagnosisError::Database(e.to_string()))
    }

    async fn is_patient(&self, user_id: Uuid, auth_token: &str) -> Result<bool, DiagnosisError> {
        let filters = format!("id=eq.{}&user_level=eq.{}", user_id, i16::from(UserLevel::Patient));
        self.supabase
            .exists("users", &filters, auth_token)
            .await
            .map_err(|e| DiagnosisError::Database(e.to_string()))
    }

    /// Only a doctor who has seen the patient at least once may diagnose them.
    pub async fn add_diagnosis(
        &self,
        actor: &Actor,
        patient_id: Uuid,
        request: AddDiagnosisRequest,
        auth_token: &str,
    ) -> Result<Diagnosis, DiagnosisError> {
        if !actor.is_doctor() {
            return Err(DiagnosisError::Forbidden("Only doctors can add diagnoses".to_string()));
        }
        let description = request.validated_description()?;

        if !self.is_patient(patient_id, auth_token).await? {
            return Err(DiagnosisError::Validation(format!("User {} is not a patient", patient_id)));
        }
        if !self.has_visit_with(actor.id, patient_id, auth_token).await? {
            warn!("Doctor {} has no visit with patient {}", actor.id, patient_id);
            return Err(DiagnosisError::Forbidden("You cannot add a diagnosis for this patient".to_string()));
        }

        debug!("Doctor {} adding diagnosis for patient {}", actor.id, patient_id);

        let row = json!({
            "doctor_id": actor.id,
            "patient_id": patient_id,
            "description": description,
            "is_active": true,
        });

        let diagnosis: Diagnosis = self.supabase
            .insert(TABLE, row, auth_token)
            .await
            .map_err(|e| DiagnosisError::Database(e.to_string()))?;

        info!("Diagnosis {} added by doctor {}", diagnosis.id, actor.id);
        Ok(diagnosis)
    }

    pub async fn get_diagnosis(&self, diagnosis_id: Uuid, auth_token: &str) -> Result<Diagnosis, DiagnosisError> {
        let rows: Vec<Diagnosis> = self.supabase
            .select(TABLE, &format!("id=eq.{}", diagnosis_id), auth_token)
            .await
            .map_err(|e| DiagnosisError::Database(e.to_string()))?;

        rows.into_iter().next().ok_or(DiagnosisError::NotFound)
    }

    /// Only the diagnosing doctor may toggle `is_active`.
    pub async fn change_status(
        &self,
        actor: &Actor,
        diagnosis_id: Uuid,
        is_active: bool,
        auth_token: &str,
    ) -> Result<Diagnosis, DiagnosisError> {
        let current = self.get_diagnosis(diagnosis_id, auth_token).await?;
        if current.doctor_id != actor.id {
            warn!("User {} denied status change on diagnosis {}", actor.id, diagnosis_id);
            return Err(DiagnosisError::Forbidden("You cannot change the status of this diagnosis".to_string()));
        }

        let rows: Vec<Diagnosis> = self.supabase
            .update(TABLE, &format!("id=eq.{}", diagnosis_id), json!({ "is_active": is_active }), auth_token)
            .await
            .map_err(|e| DiagnosisError::Database(e.to_string()))?;

        rows.into_iter().next().ok_or(DiagnosisError::NotFound)
    }

    pub async fn list_patient_diagnoses(
        &self,
        actor: &Actor,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Diagnosis>, DiagnosisError> {
        let allowed = actor.is_staff() || actor.is_doctor() || actor.id == patient_id;
        if !allowed {
            return Err(DiagnosisError::Forbidden("Not allowed to view these diagnoses".to_string()));
        }

        let filters = format!("patient_id=eq.{}&order=created_at.desc", patient_id);
        self.supabase
            .select(TABLE, &filters, auth_token)
            .await
            .map_err(|e| DiagnosisError::Database(e.to_string()))
    }
}
