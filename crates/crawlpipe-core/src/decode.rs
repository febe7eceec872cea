//! Column decoders for crawler text fields
//!
//! Every decoder is a plain `fn(&str) -> Result<Value, String>` so schemas can
//! be declared as `const` tables. The error string is the reason only; the
//! caster attaches the column name and raw value.

use crate::caster::Value;

/// Identity decoder
pub fn string(raw: &str) -> Result<Value, String> {
    Ok(Value::Str(raw.to_owned()))
}

pub fn int(raw: &str) -> Result<Value, String> {
    raw.trim()
        .parse::<i64>()
        .map(Value::Int)
        .map_err(|e| e.to_string())
}

pub fn float(raw: &str) -> Result<Value, String> {
    raw.trim()
        .parse::<f64>()
        .map(Value::Float)
        .map_err(|e| e.to_string())
}

/// Crawler booleans: only `"1"` is true, empty or anything else is false
pub fn boolean(raw: &str) -> Result<Value, String> {
    Ok(Value::Bool(raw == "1"))
}

/// Google Analytics dimension: lower-cased, `(not set)` means absent
pub fn lower_or_not_set(raw: &str) -> Result<Value, String> {
    if raw == "(not set)" {
        Ok(Value::Null)
    } else {
        Ok(Value::Str(raw.to_lowercase()))
    }
}

/// Nofollow reasons, in output order
const NOFOLLOW_MASKS: [(i64, &str); 4] = [(1, "link"), (2, "meta"), (4, "robots"), (16, "config")];

const NEXT_MASK: i64 = 32;
const PREV_MASK: i64 = 64;

/// Decode a link follow bitmask into its list of flags.
///
/// `0` and `8` are plain follow links. Otherwise `next`/`prev` come first,
/// then every nofollow reason set in the mask; `follow` is appended when no
/// nofollow reason is present.
pub fn follow_mask(raw: &str) -> Result<Value, String> {
    let mask = raw.trim().parse::<i64>().map_err(|e| e.to_string())?;
    Ok(Value::List(follow_flags(mask)))
}

pub fn follow_flags(mask: i64) -> Vec<String> {
    if mask == 0 || mask == 8 {
        return vec!["follow".to_string()];
    }
    let mut flags = Vec::new();
    if mask & NEXT_MASK == NEXT_MASK {
        flags.push("next".to_string());
    }
    if mask & PREV_MASK == PREV_MASK {
        flags.push("prev".to_string());
    }
    let mut nofollow = false;
    for (bit, reason) in NOFOLLOW_MASKS {
        if mask & bit == bit {
            flags.push(reason.to_string());
            nofollow = true;
        }
    }
    if !nofollow {
        flags.push("follow".to_string());
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(raw: &str) -> Vec<String> {
        match follow_mask(raw).unwrap() {
            Value::List(v) => v,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn int_parses_and_trims() {
        assert_eq!(int("42").unwrap(), Value::Int(42));
        assert_eq!(int(" 7\r").unwrap(), Value::Int(7));
        assert!(int("abc").is_err());
        assert!(int("").is_err());
    }

    #[test]
    fn float_parses() {
        assert_eq!(float("1.5").unwrap(), Value::Float(1.5));
        assert!(float("x").is_err());
    }

    #[test]
    fn boolean_only_one_is_true() {
        assert_eq!(boolean("1").unwrap(), Value::Bool(true));
        assert_eq!(boolean("0").unwrap(), Value::Bool(false));
        assert_eq!(boolean("").unwrap(), Value::Bool(false));
        assert_eq!(boolean("true").unwrap(), Value::Bool(false));
    }

    #[test]
    fn not_set_is_absent() {
        assert_eq!(lower_or_not_set("(not set)").unwrap(), Value::Null);
        assert_eq!(
            lower_or_not_set("Facebook").unwrap(),
            Value::Str("facebook".to_string())
        );
    }

    #[test]
    fn follow() {
        assert_eq!(flags("0"), vec!["follow"]);
        assert_eq!(flags("8"), vec!["follow"]);
    }

    #[test]
    fn nofollow_combinations() {
        // every non-empty subset of the nofollow reasons
        for subset in 1..(1 << NOFOLLOW_MASKS.len()) {
            let chosen: Vec<_> = NOFOLLOW_MASKS
                .iter()
                .enumerate()
                .filter(|(i, _)| subset & (1 << i) != 0)
                .map(|(_, m)| *m)
                .collect();
            let mask: i64 = chosen.iter().map(|(bit, _)| bit).sum();
            let expected: Vec<&str> = chosen.iter().map(|(_, name)| *name).collect();
            assert_eq!(flags(&mask.to_string()), expected, "mask {mask}");
        }
    }

    #[test]
    fn prev_next() {
        assert_eq!(flags("32"), vec!["next", "follow"]);
        assert_eq!(flags("64"), vec!["prev", "follow"]);
        assert_eq!(flags("33"), vec!["next", "link"]);
        assert_eq!(flags("68"), vec!["prev", "robots"]);
    }

    #[test]
    fn follow_mask_rejects_text() {
        assert!(follow_mask("nofollow").is_err());
    }
}
