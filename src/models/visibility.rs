use std::str::FromStr;

/// Soft-delete visibility for repo reads. `Active` excludes rows with
/// `deleted_at` set; repos opt in to `All` explicitly.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Visibility {
    Active,
    All,
}

impl Default for Visibility {
    fn default() -> Self {
        Visibility::Active
    }
}

impl FromStr for Visibility {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_ref() {
            "active" => Ok(Visibility::Active),
            "all" => Ok(Visibility::All),
            _ => Err(()),
        }
    }
}
