use crate::models::OsFamily;
use regex::Regex;
use std::sync::LazyLock;

/// Signatures in match order, first match wins
static SIGNATURES: LazyLock<Vec<(OsFamily, Regex)>> = LazyLock::new(|| {
    [
        (OsFamily::Arch, r"Arch Linux"),
        (OsFamily::Alpine, r"Alpine"),
        (OsFamily::CentOs, r"CentOS"),
        (OsFamily::Rhel, r"Red Hat"),
        (OsFamily::Ubuntu, r"Ubuntu"),
        (OsFamily::Kali, r"Kali"),
    ]
    .into_iter()
    .map(|(family, pattern)| (family, Regex::new(pattern).expect("static OS signature")))
    .collect()
});

/// Recognise the OS family from the contents of `/etc/issue`
///
/// Unrecognised text is not an error: plenty of distributions ship a blank
/// or custom issue file.
pub fn parse_issue_file(raw: &str) -> OsFamily {
    SIGNATURES
        .iter()
        .find(|(_, re)| re.is_match(raw))
        .map(|(family, _)| *family)
        .unwrap_or(OsFamily::Unknown)
}
