//! Banking and reporting tool declarations.
//!
//! Nine tools are exposed to the model. Their argument shapes are typed
//! structs so the JSON Schema sent to the model and the arguments the remote
//! API receives cannot drift apart. Execution is delegated to
//! [`RemoteTool`](super::remote::RemoteTool): each tool posts its arguments to
//! `{base_url}/{tool_name}`.

use super::core::ToolSet;
use super::remote::RemoteTool;
use crate::{ToolDef, json_schema_for};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const CHECK_BANK_BALANCE: &str = "check_bank_balance";
pub const GET_BANK_STATEMENT: &str = "get_bank_statement";
pub const IMPS_STATUS_CHECK: &str = "imps_status_check";
pub const NEFT_STATUS_CHECK: &str = "neft_status_check";
pub const RTGS_STATUS_CHECK: &str = "rtgs_status_check";
pub const TRANSACTION_STATUS_TL: &str = "transaction_status_tl";
pub const UPI_STATUS_ML: &str = "upi_status_ml";
pub const QUERY_SURY_VA: &str = "query_sury_va";
pub const QUERY_SURY_MERCHANT: &str = "query_sury_merchant";

/// Rules given to the model for natural-language to SQL conversion.
const SQL_RULES: &str = "Convert the natural language question into a SQL query. Follow these rules strictly:\n\
- Use only the tables and columns explicitly provided in the schema. If the user asks for information that does not exist, use the available fields in the most reasonable way.\n\
- Do not invent new tables, columns, or relationships.\n\
- When joins are required, infer the relationship from foreign-key naming conventions.\n\
- Fully qualify columns when necessary to avoid ambiguity.\n\
- Never return placeholders such as \"table_name\" or \"column_name\".\n\
- Prefer the simplest, most readable query that answers the question.\n\
- Use time ranges of the form BETWEEN '2026-02-01 00:00:00' AND '2026-02-19 23:59:59'.";

// ── Argument types ─────────────────────────────────────────────────

/// `check_bank_balance` takes no input.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct NoArgs {}

#[derive(Serialize, Deserialize, JsonSchema, Debug)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StatementArgs {
    /// Start date for fetching the bank statement, formatted YYYY-MM-DD.
    #[schemars(regex(pattern = r"^\d{4}-\d{2}-\d{2}$"))]
    pub from_date: String,
    /// End date for fetching the bank statement, formatted YYYY-MM-DD.
    #[schemars(regex(pattern = r"^\d{4}-\d{2}-\d{2}$"))]
    pub to_date: String,
}

/// Lookup by TransXT transaction id and/or bank reference number.
#[derive(Serialize, Deserialize, JsonSchema, Debug)]
#[serde(deny_unknown_fields)]
pub struct PayoutStatusArgs {
    /// TransXT Transaction ID from the txnId field of the payout API response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txnid: Option<String>,
    /// UTR/RRN (transaction reference number), 12 characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rrn: Option<String>,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug)]
#[serde(deny_unknown_fields)]
pub struct TxnIdArgs {
    /// TransXT Transaction ID from the txnId field of the payout API response.
    pub txnid: String,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug)]
#[serde(deny_unknown_fields)]
pub struct UpiStatusArgs {
    /// TransXT Transaction ID, at most 35 characters.
    #[schemars(length(max = 35))]
    pub txnid: String,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug)]
#[serde(deny_unknown_fields)]
pub struct SqlQueryArgs {
    /// The SQL query answering the user's question.
    pub query: String,
}

// ── Definitions ────────────────────────────────────────────────────

/// Database schemas appended to the SQL tools' parameter descriptions.
#[derive(Debug, Clone, Default)]
pub struct SqlSchemas {
    /// Schema of the virtual-accounts database.
    pub virtual_accounts: Option<String>,
    /// Schema of the merchants database.
    pub merchants: Option<String>,
}

fn sql_tool(name: &str, description: &str, schema: Option<&str>) -> ToolDef {
    let mut parameters = json_schema_for::<SqlQueryArgs>();
    let guidance = match schema {
        Some(schema) => format!("{SQL_RULES}\nUse the schema below for your query:\n{schema}"),
        None => SQL_RULES.to_string(),
    };
    if let Some(query) = parameters.pointer_mut("/properties/query") {
        query["description"] = serde_json::Value::String(guidance);
    }
    ToolDef::new(name, description, parameters)
}

/// Every tool definition in the catalog.
pub fn banking_tool_defs(schemas: &SqlSchemas) -> Vec<ToolDef> {
    vec![
        ToolDef::new(
            CHECK_BANK_BALANCE,
            "Checks the user's bank balance. No input is needed for this tool.",
            json_schema_for::<NoArgs>(),
        ),
        ToolDef::new(
            GET_BANK_STATEMENT,
            "Gets the user's bank statement for a date range.",
            json_schema_for::<StatementArgs>(),
        ),
        ToolDef::new(
            IMPS_STATUS_CHECK,
            "Checks the status of IMPS transactions using RRN or TransXT txnId.",
            json_schema_for::<PayoutStatusArgs>(),
        ),
        ToolDef::new(
            NEFT_STATUS_CHECK,
            "Checks the status of NEFT transactions using TransXT txnId.",
            json_schema_for::<PayoutStatusArgs>(),
        ),
        ToolDef::new(
            RTGS_STATUS_CHECK,
            "Checks the status of RTGS transactions using TransXT txnId.",
            json_schema_for::<PayoutStatusArgs>(),
        ),
        ToolDef::new(
            TRANSACTION_STATUS_TL,
            "Checks the status of a transaction at the TransXT layer.",
            json_schema_for::<TxnIdArgs>(),
        ),
        ToolDef::new(
            UPI_STATUS_ML,
            "Checks the status of a UPI transaction at the merchant layer.",
            json_schema_for::<UpiStatusArgs>(),
        ),
        sql_tool(
            QUERY_SURY_VA,
            "Answers natural-language questions over the Sury virtual-accounts database by running a SQL query.",
            schemas.virtual_accounts.as_deref(),
        ),
        sql_tool(
            QUERY_SURY_MERCHANT,
            "Answers natural-language questions over the Suryoday merchants database by running a SQL query.",
            schemas.merchants.as_deref(),
        ),
    ]
}

impl ToolSet {
    /// Register the banking catalog, each tool posting to `{base_url}/{name}`.
    pub fn with_remote_catalog(self, base_url: &str) -> Self {
        self.with_remote_catalog_configured(base_url, &SqlSchemas::default(), None)
    }

    /// Register the banking catalog with SQL schemas and an optional bearer
    /// token sent on every call.
    pub fn with_remote_catalog_configured(
        mut self,
        base_url: &str,
        schemas: &SqlSchemas,
        auth_token: Option<String>,
    ) -> Self {
        let base = base_url.trim_end_matches('/');
        let client = super::remote::default_http_client();
        for def in banking_tool_defs(schemas) {
            let endpoint = format!("{base}/{}", def.function.name);
            let tool = RemoteTool::new(def, endpoint)
                .with_client(client.clone())
                .with_auth_token(auth_token.clone());
            self.register(tool);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_nine_distinct_tools() {
        let defs = banking_tool_defs(&SqlSchemas::default());
        let mut names: Vec<&str> = defs.iter().map(|d| d.function.name.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 9);
    }

    #[test]
    fn statement_dates_are_required_camel_case() {
        let schema = json_schema_for::<StatementArgs>();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert!(required.contains(&"fromDate"));
        assert!(required.contains(&"toDate"));
    }

    #[test]
    fn payout_status_fields_are_optional() {
        let schema = json_schema_for::<PayoutStatusArgs>();
        assert!(schema.get("required").is_none_or(|r| r.as_array().unwrap().is_empty()));
        assert!(schema["properties"]["rrn"].is_object());
    }

    #[test]
    fn sql_schema_is_appended_to_query_description() {
        let schemas = SqlSchemas {
            virtual_accounts: Some("CREATE TABLE corporateva (vano VARCHAR);".into()),
            merchants: None,
        };
        let defs = banking_tool_defs(&schemas);
        let va = defs
            .iter()
            .find(|d| d.function.name == QUERY_SURY_VA)
            .unwrap();
        let desc = va.function.parameters["properties"]["query"]["description"]
            .as_str()
            .unwrap();
        assert!(desc.contains("CREATE TABLE corporateva"));

        let merchant = defs
            .iter()
            .find(|d| d.function.name == QUERY_SURY_MERCHANT)
            .unwrap();
        let desc = merchant.function.parameters["properties"]["query"]["description"]
            .as_str()
            .unwrap();
        assert!(!desc.contains("CREATE TABLE"));
    }

    #[test]
    fn remote_catalog_registers_every_tool() {
        let tools = ToolSet::new().with_remote_catalog("http://127.0.0.1:9/api/");
        assert_eq!(tools.len(), 9);
        assert!(tools.contains(UPI_STATUS_ML));
    }

    #[test]
    fn statement_args_round_trip_field_names() {
        let args: StatementArgs =
            serde_json::from_str(r#"{"fromDate": "2026-01-01", "toDate": "2026-01-31"}"#).unwrap();
        assert_eq!(args.from_date, "2026-01-01");
        assert!(serde_json::from_str::<StatementArgs>(r#"{"fromDate": "x"}"#).is_err());
    }
}
