//! Fixed names shared by every stage of a campaign run.

/// Name of the group every metadata model is rooted at.
pub const ROOT_GROUP_NAME: &str = "RACINE";

/// Identifier column of the survey unit.
pub const ROOT_IDENTIFIER_NAME: &str = "IdUE";

/// Column recording which collection mode a row came from.
pub const MODE_VARIABLE_NAME: &str = "MODE";

/// Binding name of the reconciled dataset.
pub const MULTIMODE_DATASET_NAME: &str = "MULTIMODE";

/// Separator between group names in a fully qualified variable name.
pub const METADATA_SEPARATOR: &str = ".";

/// Suffix of the temporary projection made for each mode during reconciliation.
pub const KEEP_SUFFIX: &str = "_keep";
