//! Form-level checks run before any network call. They are a UX guard, not a
//! defence against concurrent writers; the database constraints still apply.

use thiserror::Error;

use crate::opportunity::{OpportunityDraft, OpportunityPatch};
use crate::user::SignUpRequest;

pub const MIN_NAME_LEN: usize = 3;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("name must be at least {MIN_NAME_LEN} characters")]
    NameTooShort,
    #[error("{0} is required")]
    Required(&'static str),
    #[error("value must be greater than 0")]
    NonPositiveValue,
    #[error("probability must be between 0 and 100")]
    ProbabilityOutOfRange,
    #[error("no changes to save")]
    EmptyPatch,
    #[error("email address is invalid")]
    InvalidEmail,
    #[error("password must be at least {} characters", platform_authn::MIN_PASSWORD_LEN)]
    PasswordTooShort,
}

pub fn validate_draft(draft: &OpportunityDraft) -> Result<(), ValidationError> {
    check_name(&draft.name)?;
    check_required("company", &draft.company)?;
    check_required("contact", &draft.contact)?;
    check_value(draft.value)?;
    check_probability(draft.probability)
}

pub fn validate_patch(patch: &OpportunityPatch) -> Result<(), ValidationError> {
    if patch.is_empty() {
        return Err(ValidationError::EmptyPatch);
    }
    if let Some(name) = &patch.name {
        check_name(name)?;
    }
    if let Some(company) = &patch.company {
        check_required("company", company)?;
    }
    if let Some(contact) = &patch.contact {
        check_required("contact", contact)?;
    }
    if let Some(value) = patch.value {
        check_value(value)?;
    }
    if let Some(probability) = patch.probability {
        check_probability(probability)?;
    }
    Ok(())
}

pub fn validate_signup(request: &SignUpRequest) -> Result<(), ValidationError> {
    check_required("email", &request.email)?;
    check_required("password", &request.password)?;
    check_required("name", &request.name)?;
    if !request.email.contains('@') {
        return Err(ValidationError::InvalidEmail);
    }
    if request.password.chars().count() < platform_authn::MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

fn check_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().chars().count() < MIN_NAME_LEN {
        Err(ValidationError::NameTooShort)
    } else {
        Ok(())
    }
}

fn check_required(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(())
    }
}

fn check_value(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::NonPositiveValue)
    }
}

fn check_probability(probability: i16) -> Result<(), ValidationError> {
    if (0..=100).contains(&probability) {
        Ok(())
    } else {
        Err(ValidationError::ProbabilityOutOfRange)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::Stage;

    fn draft() -> OpportunityDraft {
        OpportunityDraft::new("Póliza hogar", "Inmobiliaria Delta", "Rocío", 2500.0)
    }

    #[test]
    fn accepts_a_complete_draft() {
        assert_eq!(validate_draft(&draft()), Ok(()));
    }

    #[test]
    fn rejects_zero_and_negative_values() {
        let mut zero = draft();
        zero.value = 0.0;
        assert_eq!(validate_draft(&zero), Err(ValidationError::NonPositiveValue));
        let mut negative = draft();
        negative.value = -10.0;
        assert_eq!(validate_draft(&negative), Err(ValidationError::NonPositiveValue));
        let mut nan = draft();
        nan.value = f64::NAN;
        assert_eq!(validate_draft(&nan), Err(ValidationError::NonPositiveValue));
    }

    #[test]
    fn rejects_short_names() {
        let mut short = draft();
        short.name = "ab".into();
        assert_eq!(validate_draft(&short), Err(ValidationError::NameTooShort));
        short.name = "  ab  ".into();
        assert_eq!(validate_draft(&short), Err(ValidationError::NameTooShort));
        short.name = "año".into();
        assert_eq!(validate_draft(&short), Ok(()));
    }

    #[test]
    fn rejects_probability_outside_range() {
        let mut over = draft();
        over.probability = 101;
        assert_eq!(validate_draft(&over), Err(ValidationError::ProbabilityOutOfRange));
        over.probability = -1;
        assert_eq!(validate_draft(&over), Err(ValidationError::ProbabilityOutOfRange));
    }

    #[test]
    fn rejects_blank_company() {
        let mut blank = draft();
        blank.company = "   ".into();
        assert_eq!(validate_draft(&blank), Err(ValidationError::Required("company")));
    }

    #[test]
    fn empty_patch_is_rejected() {
        assert_eq!(
            validate_patch(&OpportunityPatch::default()),
            Err(ValidationError::EmptyPatch)
        );
        assert_eq!(validate_patch(&OpportunityPatch::stage(Stage::Calificado)), Ok(()));
    }

    #[test]
    fn patch_checks_present_fields_only() {
        let patch = OpportunityPatch {
            value: Some(0.0),
            ..OpportunityPatch::default()
        };
        assert_eq!(validate_patch(&patch), Err(ValidationError::NonPositiveValue));
    }

    #[test]
    fn signup_requires_six_character_password() {
        let request = SignUpRequest {
            email: "nuevo@nexo.test".into(),
            password: "12345".into(),
            name: "Nuevo".into(),
            role: None,
        };
        assert_eq!(validate_signup(&request), Err(ValidationError::PasswordTooShort));
        let missing = SignUpRequest {
            name: String::new(),
            ..request
        };
        assert_eq!(validate_signup(&missing), Err(ValidationError::Required("name")));
    }
}
