//! Streaming chat example.
//!
//! Asks the backend one question, prints the answer as it streams and writes
//! the transcript as markdown at the end. Ctrl-C aborts the stream.
//!
//! Run with:
//! ```bash
//! TAXDESK_API_URL=http://localhost:8000 RUST_LOG=taxdesk=debug \
//!     cargo run --example stream_chat -- "2023年营业收入是多少" detailed
//! ```

use std::io::{self, Write};
use taxdesk::prelude::*;
use tracing_subscriber::EnvFilter;

const HISTORY_FILE: &str = "chat_history.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let question = args
        .next()
        .unwrap_or_else(|| "2023年增值税税负率是多少".to_string());
    let mode: ResponseMode = args.next().as_deref().unwrap_or("detailed").parse()?;

    let mut history = QuestionHistory::load(HISTORY_FILE);
    history.record(&question);
    history.save(HISTORY_FILE)?;

    let client = ChatClient::from_env()?;
    let acc = ConversationAccumulator::new();
    acc.submit(&question);

    println!("📝 {question}\n");

    let handlers = {
        let (message, route, chart, summary, error, done) = (
            acc.clone(),
            acc.clone(),
            acc.clone(),
            acc.clone(),
            acc.clone(),
            acc.clone(),
        );
        StreamHandlers::new()
            .on_message(move |text| {
                message.apply(&StreamEvent::message(text));
                print!("{text}");
                let _ = io::stdout().flush();
            })
            .on_route(move |r, company| {
                route.apply(&StreamEvent::route(r.clone(), company.map(str::to_string)));
                let badge = r.badge().unwrap_or(r.as_str());
                match company {
                    Some(company) => println!("[{badge}] {company}"),
                    None => println!("[{badge}]"),
                }
            })
            .on_chart(move |payload| {
                chart.apply(&StreamEvent::chart(payload.clone()));
                println!("\n📈 {}", payload.title().unwrap_or("chart"));
            })
            .on_summary(move |text| {
                summary.apply(&StreamEvent::summary(text));
            })
            .on_error(move |message| {
                error.apply(&StreamEvent::error(message));
                eprintln!("\n❌ {message}");
            })
            .on_done(move || {
                done.apply(&StreamEvent::Done);
            })
    };

    let handle = client.stream_chat(&question, None, mode, handlers);
    let abort = handle.abort_handle();

    let outcome = tokio::select! {
        outcome = handle.join() => outcome,
        _ = tokio::signal::ctrl_c() => {
            abort.abort();
            acc.stop();
            StreamOutcome::Aborted
        }
    };

    println!("\n\n--- {outcome:?}\n");
    println!("{}", acc.snapshot().to_markdown());
    Ok(())
}
