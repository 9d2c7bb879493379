pub const USERS: &str = "users";
pub const CLASSROOMS: &str = "classrooms";
pub const CLASSROOM_UNITS: &str = "classroom_units";
pub const CLASSROOM_SUBUNITS: &str = "classroom_subunits";
pub const CLASSROOM_CONTENTS: &str = "classroom_contents";
pub const METRIC_EVENTS: &str = "metric_events";
pub const CONFIG_VERSIONS: &str = "config_versions";

// Secondary index trees
pub const UNITS_BY_CLASSROOM: &str = "units_by_classroom";
pub const SUBUNITS_BY_UNIT: &str = "subunits_by_unit";
pub const CONTENTS_BY_SUBUNIT: &str = "contents_by_subunit";
