//! Control declarations and classification.
//!
//! A [`ControlDeclaration`] is what the markup layer hands over for one
//! annotated element: its tag name and attributes. Classification into a
//! [`ControlKind`] happens once, from the tag and the `type` attribute.

use std::collections::HashMap;
use std::fmt;

/// The `type` attribute.
pub const ATTR_TYPE: &str = "type";

/// The marker attribute. Its value, if any, is the options expression.
pub const ATTR_OPTIONS: &str = "autodisable";

/// The submit handler expression, honored on forms.
pub const ATTR_ON_SUBMIT: &str = "on-submit";

/// The click handler expression, honored on submit controls.
pub const ATTR_ON_CLICK: &str = "on-click";

/// What a control is, decided once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    /// A `<form>`.
    Form,
    /// A `<button>`, `<input>` or `<textarea>` with `type="submit"`.
    SubmitControl,
    /// Anything else: text inputs, selects, plain buttons.
    PlainControl,
}

impl ControlKind {
    /// Classifies an element from its tag name and `type` attribute.
    ///
    /// ```
    /// use autodisable_forms::declaration::ControlKind;
    ///
    /// assert_eq!(ControlKind::classify("FORM", None), ControlKind::Form);
    /// assert_eq!(ControlKind::classify("button", Some("submit")), ControlKind::SubmitControl);
    /// assert_eq!(ControlKind::classify("select", Some("submit")), ControlKind::PlainControl);
    /// ```
    pub fn classify(tag: &str, type_attr: Option<&str>) -> Self {
        let tag = tag.to_ascii_lowercase();
        if tag == "form" {
            return Self::Form;
        }

        let submit_capable = matches!(tag.as_str(), "button" | "input" | "textarea");
        if submit_capable && type_attr == Some("submit") {
            Self::SubmitControl
        } else {
            Self::PlainControl
        }
    }

    /// Returns `true` for [`ControlKind::Form`].
    pub const fn is_form(self) -> bool {
        matches!(self, Self::Form)
    }

    /// A short lowercase name used in logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Form => "form",
            Self::SubmitControl => "submit",
            Self::PlainControl => "plain",
        }
    }
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The interaction events a control can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    /// Form submission.
    Submit,
    /// Click on a submit control.
    Click,
}

impl TriggerKind {
    /// The attribute carrying the handler expression for this trigger.
    pub const fn attribute(self) -> &'static str {
        match self {
            Self::Submit => ATTR_ON_SUBMIT,
            Self::Click => ATTR_ON_CLICK,
        }
    }

    /// The event name, as used in logs.
    pub const fn event_name(self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Click => "click",
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_name())
    }
}

/// One annotated element as declared in markup.
///
/// # Examples
///
/// ```
/// use autodisable_forms::declaration::{ControlDeclaration, ControlKind, TriggerKind};
///
/// let decl = ControlDeclaration::new("form")
///     .attr("autodisable", r#"{"pristine": false}"#)
///     .attr("on-submit", "page.save()");
///
/// assert_eq!(decl.kind(), ControlKind::Form);
/// assert_eq!(decl.handler_expression(TriggerKind::Submit), Some("page.save()"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlDeclaration {
    tag: String,
    attributes: HashMap<String, String>,
}

impl ControlDeclaration {
    /// Creates a declaration with no attributes.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: HashMap::new(),
        }
    }

    /// Creates a declaration from an attribute map.
    pub fn from_attributes(tag: impl Into<String>, attributes: HashMap<String, String>) -> Self {
        Self {
            tag: tag.into(),
            attributes,
        }
    }

    /// Adds (or replaces) an attribute.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// The tag name as declared.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns an attribute value.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Classifies this declaration.
    pub fn kind(&self) -> ControlKind {
        ControlKind::classify(&self.tag, self.attribute(ATTR_TYPE))
    }

    /// The options expression carried by the marker attribute.
    pub fn options_expression(&self) -> Option<&str> {
        self.attribute(ATTR_OPTIONS)
    }

    /// The handler expression for a trigger, if one is declared and non-blank.
    pub fn handler_expression(&self, trigger: TriggerKind) -> Option<&str> {
        self.attribute(trigger.attribute())
            .filter(|expr| !expr.trim().is_empty())
    }
}
