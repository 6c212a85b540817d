/// Documents are BSON documents; top-level is always an object.
pub type Document = bson::Document;

/// Dotted path into a document, e.g. `fields.city`.
pub type FieldPath = String;

/// Store identity field.
pub const IDENTITY_FIELD: &str = "_id";

/// Query key that addresses the identity field instead of a user field.
pub const UID_KEY: &str = "uid";

/// Sub-document holding user fields; also the reserved distinct specifier.
pub const FIELDS_ROOT: &str = "fields";

/// Sub-document holding time-stamped points.
pub const POINTS_ROOT: &str = "points";
