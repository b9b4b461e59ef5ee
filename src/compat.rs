use crate::model::Loader;

/// Result of resolving a version's declared loaders against an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compatibility {
    pub compatible: bool,
    /// Loader the user could switch to when incompatible.
    pub suggested: Option<Loader>,
}

impl Compatibility {
    fn compatible() -> Self {
        Self {
            compatible: true,
            suggested: None,
        }
    }
}

/// Decide whether a version that declares `version_loaders` can run on an
/// environment using `environment_loader`.
///
/// Quilt is loader-compatible with fabric content, so a fabric environment
/// accepts versions that only declare "quilt"/"quilt-loader" and a quilt
/// environment accepts fabric-only versions. Pure function, no I/O.
pub fn resolve_compatibility(
    version_loaders: &[String],
    environment_loader: Loader,
) -> Compatibility {
    let declared: Vec<String> = version_loaders
        .iter()
        .map(|l| l.trim().to_lowercase())
        .collect();

    // A version that declares nothing gives no evidence of incompatibility.
    if declared.is_empty() {
        return Compatibility::compatible();
    }

    let has = |tag: &str| declared.iter().any(|l| l == tag);
    let fabric_family = has("fabric") || has("quilt") || has("quilt-loader");

    let compatible = match environment_loader {
        Loader::Fabric => fabric_family,
        Loader::Quilt => fabric_family,
        other => has(other.as_str()),
    };

    if compatible {
        return Compatibility::compatible();
    }

    let suggested = if fabric_family {
        Some(Loader::Fabric)
    } else if has("neoforge") {
        Some(Loader::NeoForge)
    } else if has("forge") {
        Some(Loader::Forge)
    } else {
        None
    };

    Compatibility {
        compatible: false,
        suggested,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaders(tags: &[&str]) -> Vec<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn fabric_version_on_fabric_environment() {
        let result = resolve_compatibility(&loaders(&["fabric"]), Loader::Fabric);
        assert!(result.compatible);
        assert_eq!(result.suggested, None);
    }

    #[test]
    fn forge_version_on_fabric_environment_suggests_forge() {
        let result = resolve_compatibility(&loaders(&["forge"]), Loader::Fabric);
        assert!(!result.compatible);
        assert_eq!(result.suggested, Some(Loader::Forge));
        assert_eq!(result.suggested.map(|l| l.label()), Some("Forge"));
    }

    #[test]
    fn quilt_only_version_is_fabric_compatible() {
        assert!(resolve_compatibility(&loaders(&["quilt"]), Loader::Fabric).compatible);
        assert!(resolve_compatibility(&loaders(&["quilt-loader"]), Loader::Fabric).compatible);
    }

    #[test]
    fn suggestion_prefers_fabric_then_neoforge_then_forge() {
        let result = resolve_compatibility(&loaders(&["forge", "neoforge", "fabric"]), Loader::Vanilla);
        assert_eq!(result.suggested, Some(Loader::Fabric));

        let result = resolve_compatibility(&loaders(&["forge", "neoforge"]), Loader::Fabric);
        assert_eq!(result.suggested, Some(Loader::NeoForge));

        let result = resolve_compatibility(&loaders(&["forge"]), Loader::NeoForge);
        assert_eq!(result.suggested, Some(Loader::Forge));
    }

    #[test]
    fn unknown_loader_set_yields_no_suggestion() {
        let result = resolve_compatibility(&loaders(&["liteloader"]), Loader::Fabric);
        assert!(!result.compatible);
        assert_eq!(result.suggested, None);
    }

    #[test]
    fn empty_declaration_is_not_treated_as_incompatible() {
        let result = resolve_compatibility(&[], Loader::Forge);
        assert!(result.compatible);
    }
}
