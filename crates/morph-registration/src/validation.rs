//! Checking and decoding a raw registration form
//!
//! Structural problems reject the submission. Individual participant fields
//! are decoded permissively: a field of the wrong type falls back to its
//! default and is reported as a [`FieldDiagnostic`].

use std::fmt;

use bytes::Bytes;
use serde_json::{Map, Value};

use crate::error::RegistrationError;

pub const PARTICIPANTS_FIELD: &str = "participants";
pub const TRANSACTION_ID_FIELD: &str = "transactionId";
pub const REFERRAL_CODE_FIELD: &str = "referralCode";
pub const TRANSACTION_IMAGE_FIELD: &str = "transactionImage";

/// An uploaded file
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// A submission as received, before any checks
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    /// JSON array of participant objects
    pub participants: Option<String>,
    pub transaction_id: Option<String>,
    pub referral_code: Option<String>,
    pub transaction_image: Option<Attachment>,
}

impl RegistrationForm {
    /// Bytes carried by the text fields and the attachment
    pub fn payload_size(&self) -> usize {
        [
            self.participants.as_deref(),
            self.transaction_id.as_deref(),
            self.referral_code.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::len)
        .sum::<usize>()
            + self
                .transaction_image
                .as_ref()
                .map_or(0, |image| image.bytes.len())
    }
}

/// One participant, with defaults filled in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParticipantDescriptor {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub college_name: String,
    pub year_of_study: i32,
    pub dual_boot: bool,
}

/// A participant field that was present but had the wrong type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDiagnostic {
    /// Position of the participant in the submitted array
    pub index: usize,
    pub field: &'static str,
    pub expected: &'static str,
}

impl fmt::Display for FieldDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "participants[{}].{} is not a {}, default used",
            self.index, self.field, self.expected
        )
    }
}

#[derive(Debug, Clone)]
pub struct ValidatedSubmission {
    /// Non-empty, in submission order
    pub participants: Vec<ParticipantDescriptor>,
    pub transaction_id: String,
    pub referral_code: Option<String>,
    pub image: Attachment,
    pub diagnostics: Vec<FieldDiagnostic>,
}

/// Run every check on `form`, in order, and decode the participants.
pub fn validate(
    form: RegistrationForm,
    max_payload_bytes: usize,
) -> Result<ValidatedSubmission, RegistrationError> {
    if form.payload_size() > max_payload_bytes {
        return Err(RegistrationError::PayloadTooLarge {
            limit: max_payload_bytes,
        });
    }

    let participants_raw = required(form.participants, PARTICIPANTS_FIELD)?;
    let transaction_id = required(form.transaction_id, TRANSACTION_ID_FIELD)?;

    let (participants, diagnostics) = decode_participants(&participants_raw)?;
    if participants.is_empty() {
        return Err(RegistrationError::MissingField(PARTICIPANTS_FIELD));
    }

    let image = form
        .transaction_image
        .filter(|image| !image.bytes.is_empty())
        .ok_or(RegistrationError::MissingAttachment)?;

    let referral_code = form.referral_code.filter(|code| !code.trim().is_empty());

    Ok(ValidatedSubmission {
        participants,
        transaction_id,
        referral_code,
        image,
        diagnostics,
    })
}

fn required(value: Option<String>, field: &'static str) -> Result<String, RegistrationError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(RegistrationError::MissingField(field))
}

/// Decode a JSON array of participant objects.
pub fn decode_participants(
    raw: &str,
) -> Result<(Vec<ParticipantDescriptor>, Vec<FieldDiagnostic>), RegistrationError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| RegistrationError::MalformedPayload(e.to_string()))?;

    let Value::Array(items) = value else {
        return Err(RegistrationError::MalformedPayload(
            "expected an array of participants".to_string(),
        ));
    };

    let mut diagnostics = Vec::new();
    let participants = items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(fields) => Ok(FieldReader {
                index,
                fields,
                diagnostics: &mut diagnostics,
            }
            .participant()),
            _ => Err(RegistrationError::MalformedPayload(format!(
                "participant {} is not an object",
                index
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok((participants, diagnostics))
}

struct FieldReader<'a> {
    index: usize,
    fields: &'a Map<String, Value>,
    diagnostics: &'a mut Vec<FieldDiagnostic>,
}

impl<'a> FieldReader<'a> {
    fn participant(mut self) -> ParticipantDescriptor {
        ParticipantDescriptor {
            name: self.string("name"),
            email: self.string("email"),
            phone: self.string("phone"),
            college_name: self.string("collegeName"),
            year_of_study: self.integer("yearOfStudy"),
            dual_boot: self.boolean("dualBoot"),
        }
    }

    /// The field's value, or `None` when absent or null
    fn present(&self, field: &str) -> Option<&'a Value> {
        self.fields.get(field).filter(|v| !v.is_null())
    }

    fn mismatch(&mut self, field: &'static str, expected: &'static str) {
        self.diagnostics.push(FieldDiagnostic {
            index: self.index,
            field,
            expected,
        });
    }

    fn string(&mut self, field: &'static str) -> String {
        match self.present(field) {
            None => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(_) => {
                self.mismatch(field, "string");
                String::new()
            }
        }
    }

    /// Fractional numbers truncate toward zero; out-of-range values saturate
    fn integer(&mut self, field: &'static str) -> i32 {
        match self.present(field) {
            None => 0,
            Some(Value::Number(n)) => match n.as_i64() {
                Some(i) => i.clamp(i32::MIN as i64, i32::MAX as i64) as i32,
                None => n.as_f64().map_or(0, |f| f.trunc() as i32),
            },
            Some(_) => {
                self.mismatch(field, "number");
                0
            }
        }
    }

    fn boolean(&mut self, field: &'static str) -> bool {
        match self.present(field) {
            None => false,
            Some(Value::Bool(b)) => *b,
            Some(_) => {
                self.mismatch(field, "boolean");
                false
            }
        }
    }
}
