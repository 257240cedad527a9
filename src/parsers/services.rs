use super::{malformed, split_lines};
use crate::models::{Service, ServiceStatus};
use crate::Result;

/// Empty line after the final newline
const TRAILER_LINES: usize = 1;

// ` [ + ]  cron` split on single spaces: ["", "[", "+", "]", "", "cron"]
const STATUS_FIELD: usize = 2;
const NAME_FIELD: usize = 5;

/// Parse `service --status-all`
///
/// A distribution without init scripts prints nothing, which is an empty
/// table rather than an error.
pub fn parse_service_list(raw: &str) -> Result<Vec<Service>> {
    const WHAT: &str = "service status";

    let lines = split_lines(raw);
    let rows = &lines[..lines.len().saturating_sub(TRAILER_LINES)];

    rows.iter()
        .map(|line| {
            let fields: Vec<&str> = line.split(' ').collect();
            let (Some(marker), Some(name)) = (fields.get(STATUS_FIELD), fields.get(NAME_FIELD))
            else {
                return Err(malformed(WHAT, "expected ` [ x ]  name` row", line));
            };

            let status = ServiceStatus::from_marker(marker).ok_or_else(|| {
                malformed(WHAT, format!("unknown status marker {:?}", marker), line)
            })?;
            if name.is_empty() {
                return Err(malformed(WHAT, "missing service name", line));
            }

            Ok(Service {
                name: name.to_string(),
                status,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sample() {
        let services =
            parse_service_list(include_str!("../../tests/fixtures/service_status_all.txt")).unwrap();
        let summary: Vec<(&str, ServiceStatus)> = services
            .iter()
            .map(|s| (s.name.as_str(), s.status))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("apparmor", ServiceStatus::Stopped),
                ("cron", ServiceStatus::Running),
                ("hwclock.sh", ServiceStatus::Unknown),
                ("nginx", ServiceStatus::Stopped),
                ("ssh", ServiceStatus::Running),
            ]
        );
    }

    #[test]
    fn test_final_line_discarded() {
        let services = parse_service_list(" [ + ]  cron\n [ - ]  nginx").unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].name, "cron");
    }

    #[test]
    fn test_empty_output() {
        assert!(parse_service_list("").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_rows() {
        assert!(parse_service_list(" [ * ]  cron\n").unwrap_err().is_malformed_output());
        assert!(parse_service_list("cron is running\n").is_err());
        assert!(parse_service_list(" [ + ]\n").is_err());
    }
}
