/// Error code registry for labflow
///
/// Error codes are organized by category:
/// - 1000-1999: Command construction errors
/// - 2000-2999: Configuration errors
/// - 3000-3999: Staging errors
/// - 4000-4099: Execution errors
/// - 4100-4199: Protocol errors
/// - 5000-5999: Workflow source errors
/// - 6000-6999: Lookup errors
/// - 9000-9999: Other errors
#[allow(dead_code)]
pub struct ErrorCode;

impl ErrorCode {
    // Command construction errors (1000-1999)
    pub const COMMAND_GENERIC: u16 = 1000;
    pub const COMMAND_INVALID_FLAG: u16 = 1001;
    pub const COMMAND_EMPTY: u16 = 1002;

    // Configuration errors (2000-2999)
    pub const CONFIG_GENERIC: u16 = 2000;
    pub const CONFIG_NOT_FOUND: u16 = 2001;
    pub const CONFIG_INVALID_YAML: u16 = 2002;
    pub const CONFIG_INVALID_JSON: u16 = 2003;
    pub const CONFIG_INVALID_VALUE: u16 = 2004;
    pub const CONFIG_VALIDATION_FAILED: u16 = 2005;

    // Staging errors (3000-3999)
    pub const STAGING_GENERIC: u16 = 3000;
    pub const STAGING_SOURCE_MISSING: u16 = 3001;
    pub const STAGING_LINK_FAILED: u16 = 3002;
    pub const STAGING_DIR_FAILED: u16 = 3003;
    pub const STAGING_WRITE_FAILED: u16 = 3004;

    // Execution errors (4000-4099)
    pub const EXEC_GENERIC: u16 = 4000;
    pub const EXEC_COMMAND_NOT_FOUND: u16 = 4001;
    pub const EXEC_TIMEOUT: u16 = 4002;
    pub const EXEC_SUBPROCESS_FAILED: u16 = 4003;
    pub const EXEC_SPAWN_FAILED: u16 = 4004;
    pub const EXEC_SIGNAL_RECEIVED: u16 = 4005;
    pub const EXEC_CANCELLED: u16 = 4006;
    pub const EXEC_OUTPUT_ERROR: u16 = 4007;

    // Protocol errors (4100-4199)
    pub const PROTOCOL_GENERIC: u16 = 4100;
    pub const PROTOCOL_INVALID_JSON: u16 = 4101;

    // Workflow source errors (5000-5999)
    pub const PULL_GENERIC: u16 = 5000;
    pub const PULL_DESTINATION_MISSING: u16 = 5001;
    pub const PULL_TOOL_FAILED: u16 = 5002;
    pub const PULL_TEMPLATE_MISSING: u16 = 5003;

    // Lookup errors (6000-6999)
    pub const NOT_FOUND_GENERIC: u16 = 6000;
    pub const NOT_FOUND_ENVIRONMENT: u16 = 6001;
    pub const NOT_FOUND_WORKFLOW: u16 = 6002;
    pub const NOT_FOUND_GENERATOR: u16 = 6003;
    pub const NOT_FOUND_DATA_TYPE: u16 = 6004;

    // Other errors (9000-9999)
    pub const OTHER_GENERIC: u16 = 9000;
}

/// Get a human-readable description for an error code
pub fn describe_error_code(code: u16) -> &'static str {
    match code {
        ErrorCode::COMMAND_GENERIC => "Invalid command",
        ErrorCode::COMMAND_INVALID_FLAG => "Invalid flag name",
        ErrorCode::COMMAND_EMPTY => "Command has no program to run",

        ErrorCode::CONFIG_GENERIC => "Configuration error",
        ErrorCode::CONFIG_NOT_FOUND => "Configuration file not found",
        ErrorCode::CONFIG_INVALID_YAML => "Invalid YAML",
        ErrorCode::CONFIG_INVALID_JSON => "Invalid JSON",
        ErrorCode::CONFIG_INVALID_VALUE => "Invalid configuration value",
        ErrorCode::CONFIG_VALIDATION_FAILED => "Configuration validation failed",

        ErrorCode::STAGING_GENERIC => "Staging error",
        ErrorCode::STAGING_SOURCE_MISSING => "Source file is missing",
        ErrorCode::STAGING_LINK_FAILED => "Failed to link file",
        ErrorCode::STAGING_DIR_FAILED => "Failed to create directory",
        ErrorCode::STAGING_WRITE_FAILED => "Failed to write file",

        ErrorCode::EXEC_GENERIC => "Execution error",
        ErrorCode::EXEC_COMMAND_NOT_FOUND => "Command not found",
        ErrorCode::EXEC_TIMEOUT => "Process timed out",
        ErrorCode::EXEC_SUBPROCESS_FAILED => "Process exited with a non-zero status",
        ErrorCode::EXEC_SPAWN_FAILED => "Failed to spawn process",
        ErrorCode::EXEC_SIGNAL_RECEIVED => "Process terminated by signal",
        ErrorCode::EXEC_CANCELLED => "Process was cancelled",
        ErrorCode::EXEC_OUTPUT_ERROR => "Failed to read process output",

        ErrorCode::PROTOCOL_GENERIC => "Protocol error",
        ErrorCode::PROTOCOL_INVALID_JSON => "Process output is not valid JSON",

        ErrorCode::PULL_GENERIC => "Workflow pull error",
        ErrorCode::PULL_DESTINATION_MISSING => "Workflow directory missing after pull",
        ErrorCode::PULL_TOOL_FAILED => "Workflow pull tool failed",
        ErrorCode::PULL_TEMPLATE_MISSING => "Workflow template not found",

        ErrorCode::NOT_FOUND_GENERIC => "Not found",
        ErrorCode::NOT_FOUND_ENVIRONMENT => "Environment not found",
        ErrorCode::NOT_FOUND_WORKFLOW => "Workflow not registered",
        ErrorCode::NOT_FOUND_GENERATOR => "Config generator not registered",
        ErrorCode::NOT_FOUND_DATA_TYPE => "Data type not found",

        ErrorCode::OTHER_GENERIC => "Unknown error",
        _ => "Unknown error code",
    }
}
