//! ============================================================================
//! Form Validation - inline checks that run before any request is sent
//! ============================================================================

use crate::error::{ClientError, FieldError, Result};
use crate::types::{ChangePasswordRequest, LoginRequest, ProductInput, RegisterRequest};

/// Minimum password length (characters, not bytes)
pub const MIN_PASSWORD_LEN: usize = 10;

/// Longest reservation note the server accepts
pub const MAX_NOTES_LEN: usize = 500;

/// Anything that is neither alphanumeric nor whitespace
pub fn has_special_char(s: &str) -> bool {
    s.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace())
}

/// Password policy shared by registration and password change
pub fn password_errors(field: &str, password: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError::new(
            field,
            format!(
                "La contraseña debe tener al menos {} caracteres",
                MIN_PASSWORD_LEN
            ),
        ));
    }
    if !has_special_char(password) {
        errors.push(FieldError::new(
            field,
            "La contraseña debe incluir al menos un carácter especial",
        ));
    }
    errors
}

pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

fn require(errors: &mut Vec<FieldError>, field: &str, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, message));
    }
}

fn finish(errors: Vec<FieldError>) -> Result<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ClientError::Validation(errors))
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        require(&mut errors, "email", &self.email, "El email es obligatorio");
        require(&mut errors, "password", &self.password, "La contraseña es obligatoria");
        finish(errors)
    }

    pub fn to_request(&self) -> LoginRequest {
        LoginRequest {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        require(&mut errors, "name", &self.name, "El nombre es obligatorio");
        if self.email.trim().is_empty() {
            errors.push(FieldError::new("email", "El email es obligatorio"));
        } else if !is_valid_email(&self.email) {
            errors.push(FieldError::new("email", "El email no es válido"));
        }
        errors.extend(password_errors("password", &self.password));
        if self.password != self.confirm_password {
            errors.push(FieldError::new(
                "confirm_password",
                "Las contraseñas no coinciden",
            ));
        }
        finish(errors)
    }

    pub fn to_request(&self) -> RegisterRequest {
        RegisterRequest {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PasswordChangeForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl PasswordChangeForm {
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        require(
            &mut errors,
            "current_password",
            &self.current_password,
            "La contraseña actual es obligatoria",
        );
        errors.extend(password_errors("new_password", &self.new_password));
        if self.new_password != self.confirm_password {
            errors.push(FieldError::new(
                "confirm_password",
                "Las contraseñas no coinciden",
            ));
        }
        if !self.current_password.is_empty() && self.current_password == self.new_password {
            errors.push(FieldError::new(
                "new_password",
                "La nueva contraseña debe ser distinta de la actual",
            ));
        }
        finish(errors)
    }

    pub fn to_request(&self) -> ChangePasswordRequest {
        ChangePasswordRequest {
            current_password: self.current_password.clone(),
            new_password: self.new_password.clone(),
        }
    }
}

pub fn validate_email_only(email: &str) -> Result<()> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(ClientError::invalid("email", "El email no es válido"))
    }
}

pub fn notes_errors(notes: Option<&str>) -> Vec<FieldError> {
    match notes {
        Some(n) if n.chars().count() > MAX_NOTES_LEN => vec![FieldError::new(
            "notes",
            format!("Las notas no pueden superar {} caracteres", MAX_NOTES_LEN),
        )],
        _ => Vec::new(),
    }
}

pub fn validate_product(input: &ProductInput) -> Result<()> {
    let mut errors = Vec::new();
    require(&mut errors, "name", &input.name, "El nombre es obligatorio");
    require(&mut errors, "category", &input.category, "La categoría es obligatoria");
    if input.variants.is_empty() {
        errors.push(FieldError::new("variants", "Añade al menos una variante"));
    }
    for (i, variant) in input.variants.iter().enumerate() {
        if variant.size.trim().is_empty() {
            errors.push(FieldError::new(
                format!("variants[{}].size", i),
                "La medida de la variante es obligatoria",
            ));
        }
        if !(variant.price >= 0.0) {
            errors.push(FieldError::new(
                format!("variants[{}].price", i),
                "El precio no puede ser negativo",
            ));
        }
    }
    finish(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VariantInput;
    use assert_matches::assert_matches;

    fn fields(result: Result<()>) -> Vec<String> {
        match result {
            Err(ClientError::Validation(errors)) => errors.into_iter().map(|e| e.field).collect(),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(()) => Vec::new(),
        }
    }

    #[test]
    fn test_password_policy() {
        assert_eq!(password_errors("p", "short!").len(), 1);
        assert_eq!(password_errors("p", "longenoughbutplain").len(), 1);
        assert_eq!(password_errors("p", "short").len(), 2);
        assert!(password_errors("p", "longenough!").is_empty());
        // ten characters exactly, counted as chars
        assert!(password_errors("p", "ñandú-1234").is_empty());
        // whitespace is not a special character
        assert_eq!(password_errors("p", "with spaces only").len(), 1);
    }

    #[test]
    fn test_registration_rejects_weak_password() {
        let form = RegistrationForm {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password: "abc".into(),
            confirm_password: "abc".into(),
        };
        assert_eq!(fields(form.validate()), vec!["password", "password"]);
    }

    #[test]
    fn test_registration_valid() {
        let form = RegistrationForm {
            name: "Ana".into(),
            email: " ana@example.com ".into(),
            password: "S3gura#2026".into(),
            confirm_password: "S3gura#2026".into(),
        };
        assert!(form.validate().is_ok());
        assert_eq!(form.to_request().email, "ana@example.com");
    }

    #[test]
    fn test_registration_field_errors() {
        let form = RegistrationForm {
            name: " ".into(),
            email: "not-an-email".into(),
            password: "S3gura#2026".into(),
            confirm_password: "different#2026".into(),
        };
        assert_eq!(fields(form.validate()), vec!["name", "email", "confirm_password"]);
    }

    #[test]
    fn test_password_change_rejects_weak_password() {
        let form = PasswordChangeForm {
            current_password: "Vieja#clave1".into(),
            new_password: "nospecial123".into(),
            confirm_password: "nospecial123".into(),
        };
        assert_eq!(fields(form.validate()), vec!["new_password"]);
    }

    #[test]
    fn test_password_change_must_differ() {
        let form = PasswordChangeForm {
            current_password: "Misma#clave1".into(),
            new_password: "Misma#clave1".into(),
            confirm_password: "Misma#clave1".into(),
        };
        assert_eq!(fields(form.validate()), vec!["new_password"]);
    }

    #[test]
    fn test_login_requires_both_fields() {
        let form = LoginForm::default();
        assert_eq!(fields(form.validate()), vec!["email", "password"]);
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_valid_email("a@b"));
        assert!(!is_valid_email("@b"));
        assert!(!is_valid_email("a@"));
        assert!(!is_valid_email("a@b@c"));
        assert!(!is_valid_email("a b@c"));
        assert_matches!(validate_email_only("x"), Err(ClientError::Validation(_)));
    }

    #[test]
    fn test_notes_limit() {
        assert!(notes_errors(None).is_empty());
        assert!(notes_errors(Some(&"a".repeat(MAX_NOTES_LEN))).is_empty());
        assert_eq!(notes_errors(Some(&"a".repeat(MAX_NOTES_LEN + 1))).len(), 1);
    }

    #[test]
    fn test_product_form() {
        let mut input = ProductInput {
            name: "Porcelánico".into(),
            category: "Pisos".into(),
            description: String::new(),
            images: vec![],
            tags: vec![],
            variants: vec![],
        };
        assert_eq!(fields(validate_product(&input)), vec!["variants"]);

        input.variants.push(VariantInput {
            size: "".into(),
            price: -1.0,
            sku: None,
        });
        assert_eq!(
            fields(validate_product(&input)),
            vec!["variants[0].size", "variants[0].price"]
        );

        input.variants[0] = VariantInput {
            size: "60x60".into(),
            price: 24.9,
            sku: Some("POR-6060".into()),
        };
        assert!(validate_product(&input).is_ok());
    }
}
