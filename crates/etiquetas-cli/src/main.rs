//! etiquetas - offline-first CLI for the SV labeling dashboards.
//!
//! Each subcommand mirrors one page of the web dashboard and shares its
//! cache: per-branch labeling stats, the stock lookup table, and the
//! per-branch unlabeled items list. Cached data renders immediately;
//! the network is only hit when the cache is missing, stale, or a
//! refresh is forced.

mod app;

use std::path::PathBuf;

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use etiquetas_core::Branch;

use app::App;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn print_usage() {
    eprintln!("Uso: etiquetas <comando> [opções]");
    eprintln!();
    eprintln!("Comandos:");
    eprintln!("  stats <filial>         Painel de etiquetas da filial");
    eprintln!("  estoque                Consulta de estoque (todas as filiais)");
    eprintln!("  sem-etiqueta <filial>  Itens em estoque sem etiqueta");
    eprintln!("  filiais                Lista as filiais configuradas");
    eprintln!("  clear-cache            Limpa o cache local");
    eprintln!();
    eprintln!("Opções:");
    eprintln!("  --refresh              Força atualização, ignorando o cache");
    eprintln!("  --export [ARQUIVO]     Exporta o resultado para planilha .xlsx");
}

/// `--export` with an optional file name after it.
fn parse_export(args: &[String]) -> Option<Option<PathBuf>> {
    let at = args.iter().position(|a| a == "--export")?;
    let file = args
        .get(at + 1)
        .filter(|a| !a.starts_with("--"))
        .map(PathBuf::from);
    Some(file)
}

fn parse_branch(args: &[String]) -> Result<&'static Branch> {
    let id = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .ok_or_else(|| anyhow::anyhow!("Informe a filial (sobral, maracanau ou caucaia)"))?;
    Branch::by_id(id).ok_or_else(|| {
        anyhow::anyhow!("Filial desconhecida: {} (use sobral, maracanau ou caucaia)", id)
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        print_usage();
        return Ok(());
    };
    let rest = &args[1..];
    let force = rest.iter().any(|a| a == "--refresh");
    let export = parse_export(rest);

    match command.as_str() {
        "stats" => App::new()?.stats(parse_branch(rest)?, force).await,
        "estoque" => App::new()?.estoque(force, export).await,
        "sem-etiqueta" => {
            let filial = parse_branch(rest)?;
            App::new()?.sem_etiqueta(filial, force, export).await
        }
        "filiais" => {
            for filial in Branch::all() {
                println!("{:<12} {}", filial.id, filial.nome);
            }
            Ok(())
        }
        "clear-cache" => App::new()?.clear_cache(),
        other => {
            eprintln!("Comando desconhecido: {}", other);
            eprintln!();
            print_usage();
            Ok(())
        }
    }
}
