//! Command implementations.
//!
//! Each command mounts the matching coordinator, drives it on a 100ms
//! tick while rendering the progress bar and elapsed counter to stderr,
//! then prints the resulting data to stdout.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::warn;

use etiquetas_core::branch::Branch;
use etiquetas_core::cache::CacheManager;
use etiquetas_core::config::Config;
use etiquetas_core::export::{self, ExportSummary};
use etiquetas_core::fetch::{
    Coordinator, DataSource, Fetch, LoadState, RefreshOutcome, StatsSource, StockSource,
    UnlabeledSource, WebhookClient,
};
use etiquetas_core::models::{BranchStats, StockRow, UnlabeledItem};
use etiquetas_core::progress::{Phase, Progress, TICK};
use etiquetas_core::store::{DiskStore, Store};
use etiquetas_core::utils::format::{
    format_brl, format_datetime_br, format_opt_brl, group_thousands, truncate,
};

/// Rows printed to the terminal before pointing at --export.
const TABLE_PREVIEW_ROWS: usize = 20;

pub struct App {
    config: Config,
    cache_dir: PathBuf,
    client: WebhookClient,
}

impl App {
    pub fn new() -> Result<Self> {
        let config = match Config::load() {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "failed to load config, using defaults");
                Config::default()
            }
        };
        let cache_dir = config
            .cache_dir()
            .unwrap_or_else(|_| PathBuf::from("./cache"));
        let client = WebhookClient::new()?;
        Ok(Self {
            config,
            cache_dir,
            client,
        })
    }

    fn cache(&self) -> Result<CacheManager<DiskStore>> {
        let store = DiskStore::new(self.cache_dir.clone())
            .context("não foi possível abrir o diretório de cache")?;
        Ok(CacheManager::new(store))
    }

    pub async fn stats(&self, filial: &'static Branch, force: bool) -> Result<()> {
        let source = StatsSource::new(filial, self.config.resolve_webhook_base());
        let mut page = Coordinator::new(source, self.cache()?, self.client.clone());
        let mut bar = Progress::dashboard();
        self.drive(&mut page, &mut bar, force).await;

        println!("Etiquetas SV {}", filial.nome);
        println!();
        match page.data() {
            Some(stats) => print_stats(stats),
            None => println!("Sem dados para exibir. Use --refresh para buscar da rede."),
        }
        print_footer(&page);
        Ok(())
    }

    pub async fn estoque(&self, force: bool, export: Option<Option<PathBuf>>) -> Result<()> {
        let source = StockSource::new(self.config.resolve_webhook_base());
        let mut page = Coordinator::new(source, self.cache()?, self.client.clone());
        let mut bar = Progress::table();
        self.drive(&mut page, &mut bar, force).await;

        let Some(snapshot) = page.data() else {
            println!("Sem dados para exibir. Use --refresh para buscar da rede.");
            return Ok(());
        };
        println!("{} registros carregados", group_thousands(snapshot.rows.len() as i64));
        println!();
        print_stock_table(&snapshot.rows);

        if let Some(target) = export {
            let path =
                target.unwrap_or_else(|| PathBuf::from(export::stock_filename(Utc::now())));
            let summary = export::export_stock(&snapshot.rows, &path)?;
            print_export_summary(&path, summary);
        }

        if let Some(upstream) = snapshot.last_update.as_deref() {
            println!();
            println!("Atualização do estoque: {}", upstream);
        }
        print_footer(&page);
        Ok(())
    }

    pub async fn sem_etiqueta(
        &self,
        filial: &'static Branch,
        force: bool,
        export: Option<Option<PathBuf>>,
    ) -> Result<()> {
        let source = UnlabeledSource::new(filial, self.config.resolve_webhook_base());
        let mut page = Coordinator::new(source, self.cache()?, self.client.clone());
        let mut bar = Progress::table();
        self.drive(&mut page, &mut bar, force).await;

        let Some(items) = page.data() else {
            println!("Sem dados para exibir. Use --refresh para buscar da rede.");
            return Ok(());
        };
        println!("Itens em Estoque sem Etiqueta - {}", filial.nome);
        println!();
        print_unlabeled_table(items);
        println!();
        println!("Total: {} itens", group_thousands(items.len() as i64));

        if let Some(target) = export {
            let path = target.unwrap_or_else(|| {
                PathBuf::from(export::unlabeled_filename(filial.id, Utc::now()))
            });
            let summary = export::export_unlabeled(items, &path)?;
            print_export_summary(&path, summary);
        }
        print_footer(&page);
        Ok(())
    }

    pub fn clear_cache(&self) -> Result<()> {
        self.cache()?.clear();
        println!("Cache limpo. A próxima consulta busca tudo da rede.");
        Ok(())
    }

    /// Mount the page and, while a request is out, tick the progress bar
    /// until it resolves (plus the success hold).
    async fn drive<D, S, F>(&self, page: &mut Coordinator<D, S, F>, bar: &mut Progress, force: bool)
    where
        D: DataSource,
        S: Store,
        F: Fetch + Clone + 'static,
    {
        page.mount();
        if force {
            if let RefreshOutcome::Throttled { retry_in_secs } = page.refresh() {
                eprintln!(
                    "Atualização forçada há pouco; tente novamente em {}s.",
                    retry_in_secs
                );
            }
        }
        if !page.is_loading() {
            return;
        }

        bar.start(Instant::now());
        let mut ticker = tokio::time::interval(TICK);
        loop {
            ticker.tick().await;
            let now = Instant::now();
            if page.poll() {
                match page.state() {
                    LoadState::Success => bar.finish(now),
                    LoadState::Failed(_) => bar.reset(),
                    _ => {}
                }
            }
            let value = bar.sample(now);
            if bar.is_visible() {
                draw_bar(value, page.loading_seconds());
            }
            match bar.phase() {
                Phase::Done => break,
                Phase::Idle if !page.is_loading() => break,
                _ => {}
            }
        }
        eprintln!();

        if let LoadState::Failed(message) = page.state() {
            eprintln!("Erro ao carregar dados: {}", message);
            if page.data().is_some() {
                eprintln!("Exibindo dados da última atualização bem-sucedida.");
            }
        }
    }
}

fn draw_bar(value: f64, seconds: Option<u64>) {
    const WIDTH: usize = 30;
    let filled = (((value / 100.0) * WIDTH as f64).round() as usize).min(WIDTH);
    let elapsed = seconds.map(|s| format!(" ({}s)", s)).unwrap_or_default();
    eprint!(
        "\rAtualizando... [{}{}] {:>3.0}%{}  ",
        "#".repeat(filled),
        "-".repeat(WIDTH - filled),
        value,
        elapsed
    );
}

fn print_stats(stats: &BranchStats) {
    let count = |n: u64| group_thousands(n as i64);
    println!(
        "Total em Estoque:                {:>12}   produtos em stk no ERP",
        count(stats.total_estoque)
    );
    println!(
        "Etiquetas em Uso:                {:>12}   {:.1}% do total",
        count(stats.produtos_etiquetados),
        stats.percentual_do_total(stats.produtos_etiquetados)
    );
    println!(
        "Em Stk sem Etiqueta:             {:>12}   {:.1}% do total",
        count(stats.em_stk_sem_etiq),
        stats.percentual_do_total(stats.em_stk_sem_etiq)
    );
    println!(
        "Produtos c/ Múltiplas Etiquetas: {:>12}   {:.1}% do total",
        count(stats.produtos_multiplas_etiquetas),
        stats.percentual_do_total(stats.produtos_multiplas_etiquetas)
    );
    println!(
        "Etiquetas Duplicadas:            {:>12}   {:.1}% do total em etiquetas extras",
        count(stats.etiquetas_duplicadas),
        stats.percentual_do_total(stats.etiquetas_duplicadas)
    );
    println!(
        "Bind sem Estoque:                {:>12}   produtos vinculados sem estoque",
        count(stats.bind_sem_stk)
    );
    println!(
        "SKUs Etiquetados:                {:>12}   total de SKUs com etiquetas",
        count(stats.sku_etiquetados)
    );
    println!();
    println!(
        "Etiquetados (únicos):            {:>12}   {:.1}% dos SKUs etiquetados",
        count(stats.etiquetados_unicos()),
        stats.percentual_etiquetados()
    );
    println!(
        "Pendentes de etiqueta:           {:>12}",
        count(stats.pendentes())
    );
}

fn print_stock_table(rows: &[StockRow]) {
    if rows.is_empty() {
        println!("Nenhum registro.");
        return;
    }
    println!(
        "{:<10} {:<40} {:<20} {:>10} {:>12} {:>12} {:>6}",
        "Código", "Produto", "Grupo", "Total", "Preço", "Promoção", "Sigla"
    );
    for row in rows.iter().take(TABLE_PREVIEW_ROWS) {
        let preco = if row.vl_preco_empresa59 != 0.0 {
            format_brl(row.vl_preco_empresa59)
        } else {
            "-".to_string()
        };
        println!(
            "{:<10} {:<40} {:<20} {:>10} {:>12} {:>12} {:>6}",
            truncate(&row.cd_chamada, 10),
            truncate(&row.nm_produto, 40),
            truncate(&row.nm_grupo_produto, 20),
            group_thousands(row.stk_total),
            preco,
            format_opt_brl(row.preco_promo),
            row.cd_sigla
        );
    }
    if rows.len() > TABLE_PREVIEW_ROWS {
        println!(
            "... e mais {} linhas (use --export para a planilha completa)",
            group_thousands((rows.len() - TABLE_PREVIEW_ROWS) as i64)
        );
    }
}

fn print_unlabeled_table(items: &[UnlabeledItem]) {
    if items.is_empty() {
        println!("Nenhum item sem etiqueta.");
        return;
    }
    println!("{:<12} {:<50} {:>10}", "Código", "Produto", "Estoque");
    for item in items {
        println!(
            "{:<12} {:<50} {:>10}",
            truncate(&item.codigo, 12),
            truncate(&item.nome, 50),
            group_thousands(item.estoque)
        );
    }
}

fn print_export_summary(path: &Path, summary: ExportSummary) {
    if summary.skipped > 0 {
        println!(
            "Exportação concluída: {} ({} linhas, {} ignoradas)",
            path.display(),
            summary.written,
            summary.skipped
        );
    } else {
        println!(
            "Exportação concluída: {} ({} linhas)",
            path.display(),
            summary.written
        );
    }
}

fn print_footer<D, S, F>(page: &Coordinator<D, S, F>)
where
    D: DataSource,
    S: Store,
    F: Fetch + Clone + 'static,
{
    if let Some(instant) = page.last_update() {
        let mut line = format!("Última atualização: {}", format_datetime_br(instant));
        if let Some(duration) = page.last_duration_secs() {
            line.push_str(&format!(" (Tempo de atualização: {:.1}s)", duration));
        }
        println!();
        println!("{}", line);
    }
}
