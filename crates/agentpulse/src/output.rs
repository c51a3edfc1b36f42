use agentpulse_core::query::StoreStatus;
use owo_colors::OwoColorize;

pub fn print_status_human(v: &StoreStatus) {
    println!("{} {}", "db".cyan(), v.db_path);
    println!("{} {}", "size".cyan(), format_bytes(v.db_size_bytes));
    println!("llm_spans={}", v.llm_spans_count);
    println!("tool_spans={}", v.tool_spans_count);
    println!("sessions={}", v.sessions_count);
    println!("commits={}", v.commits_count);
    println!("otel_metrics={}", v.otel_metrics_count);
    println!("otel_logs={}", v.otel_logs_count);
    match &v.newest_span_ts {
        Some(ts) => println!("newest_span={}", ts.to_rfc3339().green()),
        None => println!("newest_span={}", "none".yellow()),
    }
}

fn format_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    const GIB: u64 = MIB * 1024;
    match bytes {
        b if b >= GIB => format!("{:.1} GiB", b as f64 / GIB as f64),
        b if b >= MIB => format!("{:.1} MiB", b as f64 / MIB as f64),
        b if b >= KIB => format!("{:.1} KiB", b as f64 / KIB as f64),
        b => format!("{b} B"),
    }
}
