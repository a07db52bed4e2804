//! Typed payloads for every HTML form, deserialized from
//! `application/x-www-form-urlencoded` bodies. Validation returns the first
//! field-level problem as a user-facing message; the request is not applied
//! when validation fails.

use serde::Deserialize;
use url::Url;

fn require(value: &str, message: &'static str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(message.to_string());
    }
    Ok(())
}

fn require_email(value: &str) -> Result<(), String> {
    require(value, "Email is required")?;

    let (local, domain) = value
        .split_once('@')
        .ok_or_else(|| "Enter a valid email address".to_string())?;
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err("Enter a valid email address".to_string());
    }

    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), String> {
        require_email(&self.email)?;
        require(&self.password, "Password is required")?;
        require(&self.name, "Name is required")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), String> {
        require_email(&self.email)?;
        require(&self.password, "Password is required")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostForm {
    pub title: String,
    pub subtitle: String,
    pub body: String,
    pub img_url: String,
}

impl PostForm {
    pub fn validate(&self) -> Result<(), String> {
        require(&self.title, "Title is required")?;
        require(&self.subtitle, "Subtitle is required")?;
        require(&self.body, "Body is required")?;
        require(&self.img_url, "Image URL is required")?;

        if Url::parse(&self.img_url).is_err() {
            return Err("Image URL must be a valid URL".to_string());
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentForm {
    pub text: String,
}

impl CommentForm {
    pub fn validate(&self) -> Result<(), String> {
        require(&self.text, "Comment cannot be empty")?;
        Ok(())
    }
}

/// Field names mirror the contact page form inputs.
#[derive(Debug, Clone, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub msg: String,
}

impl ContactForm {
    pub fn validate(&self) -> Result<(), String> {
        require(&self.name, "Name is required")?;
        require_email(&self.email)?;
        require(&self.msg, "Message is required")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_form_validation() {
        let form = RegisterForm {
            email: "a@x.com".to_string(),
            password: "pw1".to_string(),
            name: "Alice".to_string(),
        };
        assert!(form.validate().is_ok());

        let form = RegisterForm {
            email: "not-an-email".to_string(),
            password: "pw1".to_string(),
            name: "Alice".to_string(),
        };
        assert!(form.validate().is_err());

        let form = RegisterForm {
            email: "a@x.com".to_string(),
            password: String::new(),
            name: "Alice".to_string(),
        };
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_post_form_requires_valid_url() {
        let mut form = PostForm {
            title: "Hello".to_string(),
            subtitle: "World".to_string(),
            body: "<p>Body</p>".to_string(),
            img_url: "https://example.com/cover.jpg".to_string(),
        };
        assert!(form.validate().is_ok());

        form.img_url = "not a url".to_string();
        assert!(form.validate().is_err());

        form.img_url = String::new();
        assert_eq!(form.validate().unwrap_err(), "Image URL is required");
    }

    #[test]
    fn test_comment_form_rejects_blank_text() {
        assert!(
            CommentForm {
                text: "   ".to_string()
            }
            .validate()
            .is_err()
        );
        assert!(
            CommentForm {
                text: "Nice post".to_string()
            }
            .validate()
            .is_ok()
        );
    }

    #[test]
    fn test_contact_form_validation() {
        let form = ContactForm {
            name: "Bob".to_string(),
            email: "bob@example.com".to_string(),
            phone: String::new(),
            msg: "Hi there".to_string(),
        };
        // Phone is optional; everything else is not.
        assert!(form.validate().is_ok());

        let form = ContactForm {
            name: "Bob".to_string(),
            email: "bob@example.com".to_string(),
            phone: String::new(),
            msg: String::new(),
        };
        assert!(form.validate().is_err());
    }
}
