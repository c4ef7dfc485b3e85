//! Operator and stage classification
//!
//! The decision table is data, not code: static sets of operator and stage
//! names, combined by [`Policy::resolve`](crate::Policy::resolve) into the
//! sets active for the process. Classification itself is a pair of lookups.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::policy::Policy;

/// Marker that turns a mapping key into an operator reference
pub const OPERATOR_SIGIL: char = '$';

/// Query, projection and logical operators
pub(crate) const QUERY_OPERATORS: &[&str] = &[
    "$eq", "$ne", "$gt", "$gte", "$lt", "$lte", "$in", "$nin",
    "$exists", "$type", "$regex", "$options", "$and", "$or", "$not", "$nor",
    "$size", "$elemMatch", "$all", "$mod", "$comment",
    "$bitsAllSet", "$bitsAnySet", "$bitsAllClear", "$bitsAnyClear",
    "$geoWithin", "$geoIntersects", "$near", "$nearSphere", "$geometry",
    "$box", "$center", "$centerSphere", "$polygon", "$maxDistance", "$minDistance",
    "$slice", "$meta",
];

/// Update operators and their modifiers
pub(crate) const UPDATE_OPERATORS: &[&str] = &[
    "$set", "$unset", "$inc", "$mul", "$rename", "$setOnInsert",
    "$min", "$max", "$currentDate", "$addToSet", "$pop", "$pull",
    "$push", "$pullAll", "$each", "$slice", "$sort", "$position",
];

/// Aggregation expression operators and accumulators
pub(crate) const EXPRESSION_OPERATORS: &[&str] = &[
    // accumulators
    "$sum", "$avg", "$first", "$last", "$count", "$mergeObjects",
    "$stdDevPop", "$stdDevSamp", "$top", "$bottom", "$firstN", "$lastN",
    // arithmetic
    "$add", "$subtract", "$multiply", "$divide", "$abs", "$ceil", "$floor",
    "$round", "$trunc", "$sqrt", "$pow", "$ln", "$log10",
    // comparison
    "$cmp",
    // strings
    "$concat", "$substr", "$substrCP", "$toLower", "$toUpper", "$trim",
    "$ltrim", "$rtrim", "$split", "$strLenCP", "$indexOfCP", "$regexMatch",
    // conditionals and literals
    "$cond", "$ifNull", "$switch", "$literal",
    // arrays and objects
    "$arrayElemAt", "$filter", "$map", "$reduce", "$isArray", "$concatArrays",
    "$reverseArray", "$zip", "$range", "$objectToArray", "$arrayToObject",
    "$setUnion", "$setIntersection", "$setDifference", "$getField",
    // dates
    "$dateToString", "$dateFromString", "$year", "$month", "$week",
    "$dayOfMonth", "$dayOfWeek", "$dayOfYear", "$hour", "$minute", "$second",
    "$millisecond", "$dateTrunc", "$dateAdd", "$dateSubtract", "$dateDiff",
    // conversions
    "$convert", "$toString", "$toInt", "$toLong", "$toDouble", "$toDecimal",
    "$toBool", "$toDate", "$toObjectId",
];

/// Extended JSON type wrappers (`{"$oid": "..."}` and friends)
pub(crate) const EXTENDED_JSON_OPERATORS: &[&str] = &[
    "$oid", "$date", "$numberInt", "$numberLong", "$numberDouble", "$numberDecimal",
    "$binary", "$uuid", "$timestamp", "$regularExpression", "$minKey", "$maxKey",
    "$symbol",
];

/// Operators that only dangerous mode enables
pub(crate) const MODE_GATED_OPERATORS: &[&str] = &[
    "$where",      // JavaScript execution
    "$expr",
    "$jsonSchema",
    "$text",
    "$search",
    "$language",
    "$caseSensitive",
    "$diacriticSensitive",
];

/// Operators refused in every mode
pub(crate) const DENIED_OPERATORS: &[&str] = &[
    "$function",    // JavaScript execution
    "$accumulator", // Custom JavaScript in aggregation
    "$code",        // JavaScript literal
    "$out",         // Writes outside the target collection
    "$merge",       // Writes outside the target collection
];

/// Read-only aggregation stages
pub(crate) const SAFE_STAGES: &[&str] = &[
    "$match", "$project", "$sort", "$limit", "$skip", "$group", "$unwind",
    "$lookup", "$addFields", "$set", "$unset", "$count", "$facet", "$bucket",
    "$bucketAuto", "$sample", "$replaceRoot", "$replaceWith", "$sortByCount",
];

/// Stages that only dangerous mode enables
pub(crate) const MODE_GATED_STAGES: &[&str] = &["$geoNear", "$graphLookup"];

/// Stages refused in every mode
pub(crate) const DENIED_STAGES: &[&str] = &["$out", "$merge"];

/// Operators permitted in safe mode (stage names included: they appear as keys
/// inside `$facet` and `$lookup` sub-pipelines)
pub(crate) static SAFE_OPERATOR_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    QUERY_OPERATORS
        .iter()
        .chain(UPDATE_OPERATORS)
        .chain(EXPRESSION_OPERATORS)
        .chain(EXTENDED_JSON_OPERATORS)
        .chain(SAFE_STAGES)
        .copied()
        .collect()
});

/// Returns true if the key is operator-shaped
pub fn is_operator_key(key: &str) -> bool {
    key.starts_with(OPERATOR_SIGIL)
}

/// Classification of a mapping key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorClass {
    /// Field name, or operator in the allowed set
    Safe,
    /// Operator on the absolute deny list
    Dangerous,
    /// Operator-shaped key in neither set
    Unknown,
}

impl OperatorClass {
    /// Whether a key of this class may reach the driver
    ///
    /// Unknown operators are default-denied in safe mode only.
    pub fn is_permitted(self, dangerous_mode: bool) -> bool {
        match self {
            Self::Safe => true,
            Self::Dangerous => false,
            Self::Unknown => dangerous_mode,
        }
    }
}

/// Classify a mapping key against the active policy
pub fn classify(key: &str, policy: &Policy) -> OperatorClass {
    if !is_operator_key(key) {
        return OperatorClass::Safe;
    }

    if policy.denied_operators().contains(key) {
        OperatorClass::Dangerous
    } else if policy.allowed_operators().contains(key) {
        OperatorClass::Safe
    } else {
        OperatorClass::Unknown
    }
}

/// Verdict on an aggregation stage name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageVerdict {
    Allowed,
    Denied,
}

/// Check a stage name against the active allowed-stage set
///
/// Stages are a strict whitelist in both modes; `$out` and `$merge` are
/// never in it.
pub fn classify_stage(name: &str, policy: &Policy) -> StageVerdict {
    if policy.allowed_stages().contains(name) {
        StageVerdict::Allowed
    } else {
        StageVerdict::Denied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_are_safe() {
        let policy = Policy::safe();
        for key in ["email", "price", "nested.field", "where", ""] {
            assert_eq!(classify(key, &policy), OperatorClass::Safe, "{}", key);
        }
    }

    #[test]
    fn test_allowed_operators_are_safe() {
        let policy = Policy::safe();
        for key in ["$gt", "$in", "$and", "$set", "$sum", "$oid", "$match"] {
            assert_eq!(classify(key, &policy), OperatorClass::Safe, "{}", key);
        }
    }

    #[test]
    fn test_deny_list_is_absolute() {
        for policy in [Policy::safe(), Policy::dangerous()] {
            for key in DENIED_OPERATORS {
                assert_eq!(classify(key, &policy), OperatorClass::Dangerous, "{}", key);
            }
        }
    }

    #[test]
    fn test_mode_gated_operators() {
        let safe = Policy::safe();
        let dangerous = Policy::dangerous();
        for key in ["$where", "$expr", "$jsonSchema", "$text"] {
            assert_eq!(classify(key, &safe), OperatorClass::Unknown, "{}", key);
            assert_eq!(classify(key, &dangerous), OperatorClass::Safe, "{}", key);
        }
    }

    #[test]
    fn test_unknown_operator() {
        let policy = Policy::safe();
        assert_eq!(classify("$madeUp", &policy), OperatorClass::Unknown);
        assert!(!OperatorClass::Unknown.is_permitted(false));
        assert!(OperatorClass::Unknown.is_permitted(true));
        assert!(!OperatorClass::Dangerous.is_permitted(true));
    }

    #[test]
    fn test_stage_whitelist() {
        let safe = Policy::safe();
        let dangerous = Policy::dangerous();

        assert_eq!(classify_stage("$match", &safe), StageVerdict::Allowed);
        assert_eq!(classify_stage("$graphLookup", &safe), StageVerdict::Denied);
        assert_eq!(classify_stage("$graphLookup", &dangerous), StageVerdict::Allowed);
        assert_eq!(classify_stage("$collStats", &dangerous), StageVerdict::Denied);

        for stage in DENIED_STAGES {
            assert_eq!(classify_stage(stage, &safe), StageVerdict::Denied);
            assert_eq!(classify_stage(stage, &dangerous), StageVerdict::Denied);
        }
    }

    #[test]
    fn test_static_sets_do_not_overlap_deny_list() {
        for key in DENIED_OPERATORS {
            assert!(!SAFE_OPERATOR_SET.contains(key), "{}", key);
            assert!(!MODE_GATED_OPERATORS.contains(key), "{}", key);
        }
        for stage in DENIED_STAGES {
            assert!(!SAFE_STAGES.contains(stage), "{}", stage);
            assert!(!MODE_GATED_STAGES.contains(stage), "{}", stage);
        }
    }
}
