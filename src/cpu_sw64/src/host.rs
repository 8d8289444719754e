// Copyright 2023 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::io::BufRead;

use cpu_config::CpuConfigurationError;

/// Label introducing the hardware variation field in the host description.
const CPU_VARIATION_LABEL: &str = "cpu variation";

/// Variation-to-model table for SW64 hardware generations.
const MODEL_BY_VARIATION: &[(u32, &str)] = &[(3, "core3"), (4, "core4")];

/// Classification of a single host description line.
#[derive(Debug, Eq, PartialEq)]
enum LineMatch {
    /// Line does not carry the variation field.
    Irrelevant,
    /// Line carries a well-formed variation value.
    Variation(u32),
    /// Line carries the variation label but no usable value.
    Malformed,
}

fn classify_line(line: &str) -> LineMatch {
    let rest = match line.strip_prefix(CPU_VARIATION_LABEL) {
        Some(rest) => rest,
        None => return LineMatch::Irrelevant,
    };

    let rest = rest.trim_start_matches(|c: char| c.is_ascii_whitespace());
    if rest.is_empty() {
        return LineMatch::Malformed;
    }

    // Anything but a colon here means the label was merely a prefix of a
    // longer, unrelated field name.
    let rest = match rest.strip_prefix(':') {
        Some(rest) => rest,
        None => return LineMatch::Irrelevant,
    };

    let rest = rest.trim_start_matches(|c: char| c.is_ascii_whitespace());
    if rest.is_empty() {
        return LineMatch::Malformed;
    }

    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let (digits, tail) = rest.split_at(digits_end);
    let value = match digits.parse::<u32>() {
        Ok(value) => value,
        Err(_) => return LineMatch::Malformed,
    };

    match tail.chars().next() {
        None => LineMatch::Variation(value),
        Some('.') => LineMatch::Variation(value),
        Some(c) if c.is_ascii_whitespace() => LineMatch::Variation(value),
        Some(_) => LineMatch::Malformed,
    }
}

/// Scans an open host description for the final well-formed variation value.
///
/// Scanning deliberately continues through every line even after a
/// successful match: the last matching line wins, and a malformed matching
/// line anywhere aborts the whole scan. A description with no matching line
/// yields `None`, which is not an error.
pub(crate) fn scan_variation<R: BufRead>(
    reader: R,
    path: &str,
) -> Result<Option<u32>, CpuConfigurationError> {
    let mut variation = None;

    for line in reader.lines() {
        let line = line.map_err(|err| CpuConfigurationError::IOError(path.to_string(), err))?;
        match classify_line(&line) {
            LineMatch::Irrelevant => {}
            LineMatch::Variation(value) => variation = Some(value),
            LineMatch::Malformed => {
                return Err(CpuConfigurationError::MalformedHostInfo(
                    path.to_string(),
                    line,
                ));
            }
        }
    }

    Ok(variation)
}

/// Maps a hardware variation value to its canonical model name.
pub(crate) fn model_for_variation(variation: u32) -> Option<&'static str> {
    MODEL_BY_VARIATION
        .iter()
        .find(|(candidate, _)| *candidate == variation)
        .map(|(_, model)| *model)
}

#[cfg(test)]
mod host_unit_tests {
    use std::io::Cursor;

    use super::*;

    fn scan(description: &str) -> Result<Option<u32>, CpuConfigurationError> {
        scan_variation(Cursor::new(description), "/proc/cpuinfo")
    }

    #[test]
    fn test_variation_line_parses() {
        assert_eq!(scan("cpu variation : 3\n").unwrap(), Some(3));
        assert_eq!(scan("cpu variation : 4\n").unwrap(), Some(4));
        assert_eq!(scan("cpu variation:7\n").unwrap(), Some(7));
        // A dot or trailing whitespace terminates the integer.
        assert_eq!(scan("cpu variation : 3.14\n").unwrap(), Some(3));
        assert_eq!(scan("cpu variation : 3 \n").unwrap(), Some(3));
        assert_eq!(scan("cpu variation : 3 extra\n").unwrap(), Some(3));
    }

    #[test]
    fn test_irrelevant_lines_are_skipped() {
        let description = "cpu model : sw3231\n\
                           system type : host\n\
                           cpu variation : 3\n\
                           cache size : 512 KB\n";
        assert_eq!(scan(description).unwrap(), Some(3));

        // No matching line at all is a successful empty scan.
        assert_eq!(scan("cpu model : sw3231\n").unwrap(), None);
        assert_eq!(scan("").unwrap(), None);
    }

    #[test]
    fn test_label_prefix_of_longer_field_is_skipped() {
        assert_eq!(scan("cpu variation2 : 9\n").unwrap(), None);
        assert_eq!(scan("cpu variations : 9\n").unwrap(), None);
    }

    #[test]
    fn test_last_matching_line_wins() {
        let description = "cpu variation : 3\ncpu variation : 4\n";
        assert_eq!(scan(description).unwrap(), Some(4));
    }

    #[test]
    fn test_malformed_lines_abort_the_scan() {
        for description in [
            "cpu variation\n",
            "cpu variation   \n",
            "cpu variation :\n",
            "cpu variation :   \n",
            "cpu variation : garbage\n",
            "cpu variation : 3x\n",
            "cpu variation : 99999999999\n",
        ] {
            match scan(description) {
                Err(CpuConfigurationError::MalformedHostInfo(path, _)) => {
                    assert_eq!(path, "/proc/cpuinfo")
                }
                other => panic!(
                    "CpuConfigurationError::MalformedHostInfo expected for {:?}, got {:?}",
                    description, other
                ),
            }
        }
    }

    #[test]
    fn test_late_malformed_line_discards_earlier_match() {
        let description = "cpu variation : 3\ncpu variation : garbage\n";
        assert!(matches!(
            scan(description),
            Err(CpuConfigurationError::MalformedHostInfo(_, _))
        ));
    }

    #[test]
    fn test_model_for_variation() {
        assert_eq!(model_for_variation(3), Some("core3"));
        assert_eq!(model_for_variation(4), Some("core4"));
        assert_eq!(model_for_variation(0), None);
        assert_eq!(model_for_variation(7), None);
    }
}
