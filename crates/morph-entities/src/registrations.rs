//! Registrations entity

use morph_core::DBDateTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "registrations")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub num_of_participants: i32,
    /// PIDs of the registered participants, as a JSON array
    #[sea_orm(column_type = "Json")]
    #[schema(value_type = Vec<i32>)]
    pub participants: Json,
    pub total_amount: i32,
    pub transaction_id: String,
    pub transaction_image: String,
    pub referral_code: Option<String>,
    pub mail_sent: bool,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DBDateTime,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DBDateTime,
}

impl Model {
    /// Decoded participant PIDs; entries that are not integers are skipped
    pub fn participant_ids(&self) -> Vec<i32> {
        self.participants
            .as_array()
            .map(|values| {
                values
                    .iter()
                    .filter_map(|v| v.as_i64())
                    .filter_map(|v| i32::try_from(v).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn registration(participants: Json) -> Model {
        Model {
            id: 1,
            num_of_participants: 2,
            participants,
            total_amount: 0,
            transaction_id: "TXN1".to_string(),
            transaction_image: "https://cdn.example.com/metamorphosis/a.png".to_string(),
            referral_code: None,
            mail_sent: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_participant_ids_decodes_array() {
        let model = registration(serde_json::json!([4, 5]));
        assert_eq!(model.participant_ids(), vec![4, 5]);
    }

    #[test]
    fn test_participant_ids_skips_garbage() {
        let model = registration(serde_json::json!([4, "x", null, 7]));
        assert_eq!(model.participant_ids(), vec![4, 7]);

        let model = registration(serde_json::json!({"not": "an array"}));
        assert!(model.participant_ids().is_empty());
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(registration(serde_json::json!([1]))).unwrap();
        assert_eq!(json["numOfParticipants"], 2);
        assert_eq!(json["transactionId"], "TXN1");
        assert!(json.get("referralCode").is_some());
    }
}
