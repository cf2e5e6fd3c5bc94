//! Build outcomes and the color tags derived from them.

use serde::{Deserialize, Deserializer, Serialize};

/// Outcome of a build as reported by the orchestrator.
///
/// `Building` is only observed while the build is in progress; every other
/// variant is terminal. `Unknown` covers values the orchestrator reports that
/// this crate does not model.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BuildResult {
    Building,
    Success,
    Failure,
    Aborted,
    NotBuilt,
    Unstable,
    Unknown,
}

impl BuildResult {
    /// All result values, in declaration order.
    pub const ALL: [BuildResult; 7] = [
        BuildResult::Building,
        BuildResult::Success,
        BuildResult::Failure,
        BuildResult::Aborted,
        BuildResult::NotBuilt,
        BuildResult::Unstable,
        BuildResult::Unknown,
    ];

    /// Parse a result name, ignoring case. `NOT_BUILT`, `not_built` and
    /// `not-built` are equivalent; unrecognised names map to `Unknown`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "building" => BuildResult::Building,
            "success" => BuildResult::Success,
            "failure" => BuildResult::Failure,
            "aborted" => BuildResult::Aborted,
            "not_built" => BuildResult::NotBuilt,
            "unstable" => BuildResult::Unstable,
            _ => BuildResult::Unknown,
        }
    }

    /// Whether the build has finished.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BuildResult::Building)
    }

    /// Status text used in the full status message.
    pub fn status_text(&self) -> &'static str {
        match self {
            BuildResult::Building => "Starting...",
            BuildResult::Success => "Success",
            BuildResult::Failure => "**FAILURE**",
            BuildResult::Aborted => "ABORTED",
            BuildResult::NotBuilt => "Not built",
            BuildResult::Unstable => "Unstable",
            BuildResult::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for BuildResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BuildResult::Building => "building",
            BuildResult::Success => "success",
            BuildResult::Failure => "failure",
            BuildResult::Aborted => "aborted",
            BuildResult::NotBuilt => "not_built",
            BuildResult::Unstable => "unstable",
            BuildResult::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

impl<'de> Deserialize<'de> for BuildResult {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(BuildResult::from_name(&name))
    }
}

/// Coarse severity hint handed to the chat service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Green,
    Red,
    Yellow,
}

impl Color {
    /// Map a build result to its color tag.
    ///
    /// Success is green, failure is red, everything else is yellow.
    pub fn for_result(result: BuildResult) -> Self {
        match result {
            BuildResult::Success => Color::Green,
            BuildResult::Failure => Color::Red,
            BuildResult::Aborted
            | BuildResult::NotBuilt
            | BuildResult::Unstable
            | BuildResult::Building
            | BuildResult::Unknown => Color::Yellow,
        }
    }

    /// Lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Green => "green",
            Color::Red => "red",
            Color::Yellow => "yellow",
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_for_result_is_total() {
        let colors: Vec<Color> = BuildResult::ALL.iter().map(|r| Color::for_result(*r)).collect();
        assert_eq!(colors.len(), BuildResult::ALL.len());
        assert_eq!(Color::for_result(BuildResult::Success), Color::Green);
        assert_eq!(Color::for_result(BuildResult::Failure), Color::Red);
    }

    #[test]
    fn test_non_binary_results_are_yellow() {
        for result in [
            BuildResult::Aborted,
            BuildResult::NotBuilt,
            BuildResult::Unstable,
            BuildResult::Building,
            BuildResult::Unknown,
        ] {
            assert_eq!(Color::for_result(result), Color::Yellow, "{result}");
        }
    }

    #[test]
    fn test_status_text() {
        assert_eq!(BuildResult::Building.status_text(), "Starting...");
        assert_eq!(BuildResult::Success.status_text(), "Success");
        assert_eq!(BuildResult::Failure.status_text(), "**FAILURE**");
        assert_eq!(BuildResult::Aborted.status_text(), "ABORTED");
        assert_eq!(BuildResult::NotBuilt.status_text(), "Not built");
        assert_eq!(BuildResult::Unstable.status_text(), "Unstable");
        assert_eq!(BuildResult::Unknown.status_text(), "Unknown");
    }

    #[test]
    fn test_unrecognised_result_deserializes_as_unknown() {
        let result: BuildResult = serde_json::from_str("\"cancelled\"").expect("deserialize");
        assert_eq!(result, BuildResult::Unknown);

        let result: BuildResult = serde_json::from_str("\"not_built\"").expect("deserialize");
        assert_eq!(result, BuildResult::NotBuilt);

        let result: BuildResult = serde_json::from_str("\"SUCCESS\"").expect("deserialize");
        assert_eq!(result, BuildResult::Success);
    }

    #[test]
    fn test_only_building_is_not_terminal() {
        assert!(!BuildResult::Building.is_terminal());
        assert!(BuildResult::Success.is_terminal());
        assert!(BuildResult::Unknown.is_terminal());
    }

    #[test]
    fn test_color_wire_names() {
        assert_eq!(serde_json::to_string(&Color::Yellow).unwrap(), "\"yellow\"");
        assert_eq!(Color::Red.to_string(), "red");
    }
}
