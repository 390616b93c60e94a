use super::{addr_or_dash, require_headers, ReportError, Reporter, Table};
use tracer_trace::Trace;

/// Header checks happen in this order; the first one missing is reported.
const REQUIRED: [&str; 4] = [
    "Saturn-Transfer-Id",
    "Saturn-Node-Id",
    "Saturn-Node-Version",
    "Saturn-Cache-Status",
];

/// Details of a retrieval served through the Saturn CDN.
pub struct SaturnReporter;

impl Reporter for SaturnReporter {
    fn title(&self) -> &'static str {
        "Saturn CDN"
    }

    fn description(&self) -> &'static str {
        "Shows information about Saturn CDN, where applicable"
    }

    fn report(&self, trace: &Trace) -> Result<String, ReportError> {
        let [transfer_id, node_id, node_version, cache_status] =
            require_headers(trace, REQUIRED)?;
        let session = &trace.record().session;

        let mut t = Table::new(vec![
            "Client",
            "Transfer ID",
            "Saturn Node",
            "Saturn Node ID",
            "Node Version",
            "Cache Status",
        ]);
        t.push_row(vec![
            addr_or_dash(session.local()),
            transfer_id.to_string(),
            addr_or_dash(session.remote()),
            node_id.to_string(),
            node_version.to_string(),
            cache_status.to_string(),
        ]);
        Ok(t.to_string())
    }
}
