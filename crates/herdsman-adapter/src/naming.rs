//! Host name validation and generation
//!
//! A hardware profile name format of `*` means host names are supplied by
//! the caller. Any other format is a template: a run of `#R` is replaced by
//! the zero-padded rack number and a run of `#N` by the smallest free slot,
//! e.g. `compute-#NN` yields `compute-01`, `compute-02`, ...

use std::collections::BTreeSet;

use herdsman_db::host_part;

use crate::error::AdapterError;

/// Name format requiring explicit host names
pub const WILDCARD_FORMAT: &str = "*";

/// Check that an explicit host name is given exactly when the format wants one
///
/// # Errors
/// Returns `ConfigurationError` on mismatch
pub fn validate_host_name(hostname: Option<&str>, name_format: &str) -> Result<(), AdapterError> {
    let wildcard = name_format == WILDCARD_FORMAT;

    match hostname {
        Some(_) if !wildcard => Err(AdapterError::ConfigurationError(
            "hardware profile does not allow setting host names of imported nodes".to_string(),
        )),
        None if wildcard => Err(AdapterError::ConfigurationError(
            "hardware profile requires host names to be set".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Generates unique host names from a name format
///
/// Names handed out by one namer are remembered, so a batch of nodes
/// created in the same request never collides with itself.
#[derive(Debug, Clone, Default)]
pub struct HostNamer {
    taken: BTreeSet<String>,
    dns_zone: Option<String>,
}

impl HostNamer {
    /// Create a namer that avoids the given existing node names
    pub fn new<'a>(existing: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            taken: existing
                .into_iter()
                .map(|n| host_part(n).to_string())
                .collect(),
            dns_zone: None,
        }
    }

    /// Qualify generated names with a DNS zone
    #[must_use]
    pub fn with_dns_zone(mut self, zone: Option<String>) -> Self {
        self.dns_zone = zone.filter(|z| !z.is_empty());
        self
    }

    /// Mark an explicitly supplied name as used
    pub fn reserve(&mut self, name: &str) {
        self.taken.insert(host_part(name).to_string());
    }

    /// Next free name for `name_format`
    ///
    /// Formats without a `#N` run get `-#NN` appended.
    ///
    /// # Errors
    /// Returns `InvalidArgument` when the slot or rack number no longer
    /// fits the width of its run
    pub fn next_name(&mut self, name_format: &str, rack: Option<i32>) -> Result<String, AdapterError> {
        let rack = u64::try_from(rack.unwrap_or(0)).map_err(|_| {
            AdapterError::InvalidArgument(format!("negative rack number (format=[{name_format}])"))
        })?;

        let mut base = substitute(name_format, 'R', rack)
            .map_err(|e| AdapterError::InvalidArgument(format!("{e} (format=[{name_format}])")))?;
        if !base.contains("#N") {
            base.push_str("-#NN");
        }

        let mut slot = 1;
        loop {
            let name = substitute(&base, 'N', slot).map_err(|e| {
                AdapterError::InvalidArgument(format!("{e} (format=[{name_format}])"))
            })?;

            if self.taken.insert(name.clone()) {
                return Ok(match &self.dns_zone {
                    Some(zone) => format!("{name}.{zone}"),
                    None => name,
                });
            }

            slot += 1;
        }
    }
}

/// Replace the first `#X` run in `s` with `value`, zero-padded to the run width
fn substitute(s: &str, specifier: char, value: u64) -> Result<String, String> {
    let marker = format!("#{specifier}");
    let Some(start) = s.find(&marker) else {
        return Ok(s.to_string());
    };

    let width = s[start + 1..]
        .chars()
        .take_while(|c| *c == specifier)
        .count();

    let limit = u32::try_from(width)
        .ok()
        .and_then(|w| 10u64.checked_pow(w))
        .map_or(u64::MAX, |p| p - 1);
    if value > limit {
        return Err("unable to generate unique host name".to_string());
    }

    let left = &s[..start];
    let right = &s[start + 1 + width..];

    Ok(format!("{left}{value:0width$}{right}"))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_wildcard_requires_name() {
        assert!(validate_host_name(Some("node1"), "*").is_ok());
        assert!(matches!(
            validate_host_name(None, "*"),
            Err(AdapterError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_template_forbids_name() {
        assert!(validate_host_name(None, "compute-#NN").is_ok());
        assert!(matches!(
            validate_host_name(Some("node1"), "compute-#NN"),
            Err(AdapterError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_generates_smallest_free_slot() {
        let mut namer = HostNamer::new(["compute-01", "compute-03.cluster.local"]);

        assert_eq!(namer.next_name("compute-#NN", None).unwrap(), "compute-02");
        assert_eq!(namer.next_name("compute-#NN", None).unwrap(), "compute-04");
    }

    #[test]
    fn test_rack_substitution() {
        let mut namer = HostNamer::default();

        assert_eq!(
            namer.next_name("rack#RR-node#NNN", Some(3)).unwrap(),
            "rack03-node001"
        );
    }

    #[test]
    fn test_format_without_slot_gets_suffix() {
        let mut namer = HostNamer::default();

        assert_eq!(namer.next_name("gpu", None).unwrap(), "gpu-01");
        assert_eq!(namer.next_name("gpu", None).unwrap(), "gpu-02");
    }

    #[test]
    fn test_exhausted_width_is_rejected() {
        let existing: Vec<String> = (1..=9).map(|i| format!("n{i}")).collect();
        let mut namer = HostNamer::new(existing.iter().map(String::as_str));

        assert!(matches!(
            namer.next_name("n#N", None),
            Err(AdapterError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_dns_zone_and_reserve() {
        let mut namer = HostNamer::default().with_dns_zone(Some("lab".to_string()));
        namer.reserve("c-01.lab");

        assert_eq!(namer.next_name("c-#NN", None).unwrap(), "c-02.lab");
    }
}
