use std::sync::LazyLock;

use regex::Regex;

use crate::error::ConfigError;

static REGION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(us|us-gov|us-iso|us-isob|eu|eusc|ap|sa|ca|me|af|il|mx|cn)-",
        r"(north|south|east|west|central|northeast|southeast|northwest|southwest",
        r"|iso-east|iso-west|isob-east)-[1-9]$",
    ))
    .expect("valid")
});

pub fn validate_region(region: &str) -> Result<(), ConfigError> {
    if REGION_RE.is_match(region) {
        Ok(())
    } else {
        Err(ConfigError::InvalidRegion(region.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_regions_are_valid() {
        for r in [
            "us-east-1",
            "us-west-2",
            "eu-central-1",
            "ap-southeast-2",
            "us-gov-west-1",
            "cn-northwest-1",
            "il-central-1",
        ] {
            assert!(validate_region(r).is_ok(), "{r}");
        }
    }

    #[test]
    fn malformed_regions_are_rejected() {
        for r in ["us-south-14", "useast1", "US-EAST-1", "mars-east-1", ""] {
            assert!(validate_region(r).is_err(), "{r}");
        }
    }
}
