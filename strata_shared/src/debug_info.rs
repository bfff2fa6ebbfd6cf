use std::{borrow::Cow, fmt, time::Instant};

/// Source location at which a value was created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeLocation {
    pub file: &'static str,
    pub line: u32,
}

impl fmt::Display for CodeLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Information attached to textures, images and resource groups that helps
/// tracking them down in logs.
#[derive(Default, Debug, Clone)]
pub struct DebugInfo {
    name: Option<Cow<'static, str>>,
    origin_function_name: Option<&'static str>,
    code_location: Option<CodeLocation>,
    created_instant: Option<Instant>,
}

impl DebugInfo {
    pub fn with_name(mut self, name: Cow<'static, str>) -> Self {
        self.name = Some(name);
        self
    }

    pub fn with_origin_function_name(mut self, origin_function_name: impl Into<&'static str>) -> Self {
        self.origin_function_name = Some(origin_function_name.into());
        self
    }

    pub fn with_code_location(mut self, code_location: CodeLocation) -> Self {
        self.code_location = Some(code_location);
        self
    }

    pub fn with_created_instant(mut self, created_instant: Instant) -> Self {
        self.created_instant = Some(created_instant);
        self
    }

    pub fn with_created_now(self) -> Self {
        self.with_created_instant(Instant::now())
    }

    /// Returns the name or `"unknown"` when no name was given.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("unknown")
    }

    /// Returns the name of the function in which the `DebugInfo` was created.
    pub fn origin_function_name(&self) -> Option<&'static str> {
        self.origin_function_name
    }

    pub fn code_location(&self) -> Option<&CodeLocation> {
        self.code_location.as_ref()
    }

    pub fn created_instant(&self) -> Option<Instant> {
        self.created_instant
    }

    pub fn format_one_line(&self) -> String {
        match &self.code_location {
            Some(code_location) => format!("DebugInfo {{ name: {}, location: {code_location} }}", self.name()),
            None => format!("DebugInfo {{ name: {} }}", self.name()),
        }
    }
}

/// Implemented by everything that carries a [`DebugInfo`]
pub trait AsDebugInfo {
    fn as_debug_info(&self) -> &DebugInfo;
}

#[macro_export]
macro_rules! code_location {
    () => {
        $crate::CodeLocation {
            file: file!(),
            line: line!(),
        }
    };
}

/// Creates a [`DebugInfo`] with the given name, the calling function and the current code location.
#[macro_export]
macro_rules! debug_info {
    ($name:literal) => {
        $crate::DebugInfo::default()
            .with_name(std::borrow::Cow::Borrowed($name))
            .with_origin_function_name($crate::function_name!())
            .with_code_location($crate::code_location!())
            .with_created_now()
    };
    ($name:expr) => {
        $crate::DebugInfo::default()
            .with_name(std::borrow::Cow::Owned($name.to_string()))
            .with_origin_function_name($crate::function_name!())
            .with_code_location($crate::code_location!())
            .with_created_now()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unnamed() {
        let debug_info = DebugInfo::default();
        assert_eq!(debug_info.name(), "unknown");
        assert_eq!(debug_info.format_one_line(), "DebugInfo { name: unknown }");
    }

    #[test]
    fn owned_name() {
        let slice = 3;
        let debug_info = debug_info!(format!("terrain-slice-{slice}"));
        assert_eq!(debug_info.name(), "terrain-slice-3");
    }

    #[test]
    fn macro_fills_all_fields() {
        let debug_info = debug_info!("terrain_array");
        assert_eq!(debug_info.name(), "terrain_array");
        assert_eq!(
            debug_info.origin_function_name(),
            Some("strata_shared::debug_info::tests::macro_fills_all_fields")
        );
        assert!(debug_info.code_location().unwrap().file.ends_with("debug_info.rs"));
        assert!(debug_info.created_instant().is_some());
    }

    #[test]
    fn format_with_location() {
        let debug_info = DebugInfo::default()
            .with_name(Cow::Borrowed("terrain_array"))
            .with_code_location(CodeLocation { file: "main.rs", line: 7 });
        assert_eq!(debug_info.format_one_line(), "DebugInfo { name: terrain_array, location: main.rs:7 }");
    }
}
