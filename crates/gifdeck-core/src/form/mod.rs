//! Form-mode state machine for the gifdeck modal.
//!
//! Four mutually exclusive form modes share one modal: Login, SignUp,
//! Upload, and Update. This module holds the mode resolution rules and the
//! per-mode field/error state; [`controller`] drives submissions.

mod controller;

pub use controller::{FormController, SubmitOutcome};

use crate::gifs::GifFile;

/// The single active form purpose. `Closed` means the modal is not shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Closed,
    Login,
    SignUp,
    Upload,
    Update,
}

impl FormMode {
    /// Resolve the active mode from the four independent flags.
    ///
    /// Precedence when more than one flag is set: Upload > Update > Login >
    /// SignUp. The flags are maintained one-active-at-a-time by the
    /// controller, so the precedence only matters for defensive resolution.
    pub fn resolve(flags: &FormFlags) -> Self {
        if flags.upload {
            Self::Upload
        } else if flags.update {
            Self::Update
        } else if flags.login {
            Self::Login
        } else if flags.sign_up {
            Self::SignUp
        } else {
            Self::Closed
        }
    }

}

/// The four independent open-form flags the mode is derived from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormFlags {
    pub upload: bool,
    pub update: bool,
    pub login: bool,
    pub sign_up: bool,
}

impl FormFlags {
    /// Flags with exactly the given mode set.
    pub fn for_mode(mode: FormMode) -> Self {
        let mut flags = Self::default();
        match mode {
            FormMode::Closed => {}
            FormMode::Login => flags.login = true,
            FormMode::SignUp => flags.sign_up = true,
            FormMode::Upload => flags.upload = true,
            FormMode::Update => flags.update = true,
        }
        flags
    }
}

/// Header and primary-field label for the active mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormDescriptor {
    pub header: String,
    pub primary_field_label: String,
}

impl FormDescriptor {
    pub fn for_mode(mode: FormMode) -> Self {
        let (header, primary_field_label) = match mode {
            FormMode::Closed => ("", ""),
            FormMode::Login => ("Login Form", "Username"),
            FormMode::SignUp => ("Sign Up Form", "Username"),
            FormMode::Upload => ("Upload Form", "Name"),
            FormMode::Update => ("Update Form", "Name"),
        };
        Self {
            header: header.to_string(),
            primary_field_label: primary_field_label.to_string(),
        }
    }

    /// Submit-button caption: the first word of the header.
    pub fn submit_caption(&self) -> &str {
        self.header.split_whitespace().next().unwrap_or("")
    }
}

/// Per-mode input values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldState {
    pub name: String,
    pub password: String,
    pub password_confirm: String,
    pub file: Option<GifFile>,
    pub tag_input: String,
    pub selected_tags: Vec<String>,
}

impl FieldState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Append a tag. Duplicates are not prevented at this layer.
    pub fn select_tag(&mut self, tag: impl Into<String>) {
        self.selected_tags.push(tag.into());
    }

    /// Remove the first occurrence of `tag`. No-op when absent.
    pub fn deselect_tag(&mut self, tag: &str) {
        if let Some(position) = self.selected_tags.iter().position(|t| t == tag) {
            self.selected_tags.remove(position);
        }
    }
}

/// Per-field error messages. Empty string means "no error".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorState {
    pub name: String,
    pub file: String,
    pub tags: String,
    pub password: String,
    pub password_confirm: String,
}

impl ErrorState {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// A message for the embedding surface's alert queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn resolve_prefers_upload_over_all_other_flags() {
        let flags = FormFlags {
            upload: true,
            update: true,
            login: true,
            sign_up: true,
        };
        assert_eq!(FormMode::resolve(&flags), FormMode::Upload);
    }

    #[test]
    fn resolve_tie_break_order_is_upload_update_login_sign_up() {
        let both = FormFlags {
            upload: true,
            login: true,
            ..FormFlags::default()
        };
        assert_eq!(FormMode::resolve(&both), FormMode::Upload);

        let update_and_sign_up = FormFlags {
            update: true,
            sign_up: true,
            ..FormFlags::default()
        };
        assert_eq!(FormMode::resolve(&update_and_sign_up), FormMode::Update);

        let login_and_sign_up = FormFlags {
            login: true,
            sign_up: true,
            ..FormFlags::default()
        };
        assert_eq!(FormMode::resolve(&login_and_sign_up), FormMode::Login);
    }

    #[test]
    fn resolve_with_no_flags_is_closed() {
        assert_eq!(FormMode::resolve(&FormFlags::default()), FormMode::Closed);
    }

    #[test]
    fn flags_for_mode_round_trip() {
        for mode in [
            FormMode::Closed,
            FormMode::Login,
            FormMode::SignUp,
            FormMode::Upload,
            FormMode::Update,
        ] {
            assert_eq!(FormMode::resolve(&FormFlags::for_mode(mode)), mode);
        }
    }

    #[test]
    fn descriptor_headers_and_labels() {
        let login = FormDescriptor::for_mode(FormMode::Login);
        assert_eq!(login.header, "Login Form");
        assert_eq!(login.primary_field_label, "Username");
        assert_eq!(login.submit_caption(), "Login");

        let sign_up = FormDescriptor::for_mode(FormMode::SignUp);
        assert_eq!(sign_up.header, "Sign Up Form");
        assert_eq!(sign_up.submit_caption(), "Sign");

        let upload = FormDescriptor::for_mode(FormMode::Upload);
        assert_eq!(upload.primary_field_label, "Name");
        assert_eq!(upload.submit_caption(), "Upload");

        let closed = FormDescriptor::for_mode(FormMode::Closed);
        assert_eq!(closed.header, "");
        assert_eq!(closed.submit_caption(), "");
    }

    #[test]
    fn select_tag_keeps_insertion_order_and_duplicates() {
        let mut fields = FieldState::default();
        fields.select_tag("cats");
        fields.select_tag("loop");
        fields.select_tag("cats");
        assert_eq!(fields.selected_tags, vec!["cats", "loop", "cats"]);
    }

    #[test]
    fn deselect_tag_removes_first_occurrence_only() {
        let mut fields = FieldState::default();
        fields.select_tag("cats");
        fields.select_tag("loop");
        fields.select_tag("cats");

        fields.deselect_tag("cats");
        assert_eq!(fields.selected_tags, vec!["loop", "cats"]);

        fields.deselect_tag("cats");
        assert_eq!(fields.selected_tags, vec!["loop"]);
    }

    #[test]
    fn reset_clears_every_input() {
        let mut fields = FieldState {
            name: "party".to_string(),
            password: "hunter2".to_string(),
            password_confirm: "hunter2".to_string(),
            file: Some(GifFile::new("party.gif", vec![1])),
            tag_input: "ca".to_string(),
            selected_tags: vec!["cats".to_string()],
        };
        fields.reset();
        assert_eq!(fields, FieldState::default());
    }

    #[test]
    fn deselect_absent_tag_is_a_no_op() {
        let mut fields = FieldState::default();
        fields.select_tag("loop");
        fields.deselect_tag("missing");
        assert_eq!(fields.selected_tags, vec!["loop"]);
    }

    #[test]
    fn error_state_clear_resets_every_surface() {
        let mut errors = ErrorState {
            name: "taken".to_string(),
            file: "not a gif".to_string(),
            tags: "too many".to_string(),
            password: "too short".to_string(),
            password_confirm: "mismatch".to_string(),
        };
        assert!(!errors.is_empty());
        errors.clear();
        assert!(errors.is_empty());
    }
}
