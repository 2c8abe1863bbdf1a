//! Spreadsheet export of the in-memory row sets.
//!
//! Exports serialize whatever the page currently displays - no re-fetch.
//! Cells are written as pre-formatted pt-BR strings so the file matches
//! the dashboard exactly. The workbook is built in memory and written in
//! one save, so a failed export never leaves a partial file behind.

use std::path::Path;

use chrono::{DateTime, Utc};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use thiserror::Error;
use tracing::warn;

use crate::models::{StockRow, UnlabeledItem};
use crate::utils::format::{fortaleza, format_brl, format_date_br, format_opt_brl, group_thousands};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("não há dados para exportar")]
    Empty,

    #[error("erro ao gerar planilha: {0}")]
    Spreadsheet(#[from] XlsxError),
}

/// Rows written and rows skipped as malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    pub written: usize,
    pub skipped: usize,
}

const STOCK_SHEET: &str = "Consulta Estoque";
const UNLABELED_SHEET: &str = "Itens Sem Etiqueta";

/// Fixed column layout of the stock export: header and width.
const STOCK_COLUMNS: [(&str, f64); 19] = [
    ("Código", 12.0),
    ("Produto", 50.0),
    ("Grupo", 25.0),
    ("Família", 25.0),
    ("Matriz", 10.0),
    ("CD", 10.0),
    ("Exp BM", 10.0),
    ("Exp WS", 10.0),
    ("Exp Maracanau", 10.0),
    ("Juazeiro", 10.0),
    ("Exp Sobral", 10.0),
    ("Total", 10.0),
    ("Preço", 15.0),
    ("Promoção", 15.0),
    ("Status", 10.0),
    ("Preço De", 15.0),
    ("Início", 12.0),
    ("Fim", 12.0),
    ("Sigla", 8.0),
];

/// `consulta-estoque_2025-11-03_14-05-09.xlsx` - date and time, so
/// repeated exports on the same day don't collide.
pub fn stock_filename(now: DateTime<Utc>) -> String {
    format!(
        "consulta-estoque_{}.xlsx",
        fortaleza(now).format("%Y-%m-%d_%H-%M-%S")
    )
}

/// `itens-sem-etiqueta-sobral-2025-11-03.xlsx`
pub fn unlabeled_filename(branch_id: &str, now: DateTime<Utc>) -> String {
    format!(
        "itens-sem-etiqueta-{}-{}.xlsx",
        branch_id,
        fortaleza(now).format("%Y-%m-%d")
    )
}

/// Export the stock lookup rows. A row that fails to write is skipped and
/// counted, never fatal to the whole export.
pub fn export_stock(rows: &[StockRow], path: &Path) -> Result<ExportSummary, ExportError> {
    if rows.is_empty() {
        return Err(ExportError::Empty);
    }

    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();
    worksheet.set_name(STOCK_SHEET)?;

    let header = Format::new().set_bold();
    for (col, (title, width)) in STOCK_COLUMNS.iter().enumerate() {
        worksheet.set_column_width(col as u16, *width)?;
        worksheet.write_string_with_format(0, col as u16, *title, &header)?;
    }

    let mut written = 0usize;
    let mut skipped = 0usize;
    for row in rows {
        match write_stock_row(&mut worksheet, (written + 1) as u32, row) {
            Ok(()) => written += 1,
            Err(e) => {
                warn!(id = row.id, error = %e, "skipping row in export");
                skipped += 1;
            }
        }
    }

    workbook.push_worksheet(worksheet);
    workbook.save(path)?;
    Ok(ExportSummary { written, skipped })
}

fn write_stock_row(ws: &mut Worksheet, r: u32, row: &StockRow) -> Result<(), XlsxError> {
    ws.write_string(r, 0, &row.cd_chamada)?;
    ws.write_string(r, 1, &row.nm_produto)?;
    ws.write_string(r, 2, &row.nm_grupo_produto)?;
    ws.write_string(r, 3, &row.nm_familia_produto)?;
    for (i, (_, quantity)) in row.quantidades().iter().enumerate() {
        ws.write_string(r, (4 + i) as u16, &group_thousands(*quantity))?;
    }
    ws.write_string(r, 11, &group_thousands(row.stk_total))?;
    // A zero price means "no price registered", shown as "-"
    let preco = if row.vl_preco_empresa59 != 0.0 {
        format_brl(row.vl_preco_empresa59)
    } else {
        "-".to_string()
    };
    ws.write_string(r, 12, &preco)?;
    ws.write_string(r, 13, &format_opt_brl(row.preco_promo))?;
    ws.write_string(r, 14, row.status_promo.as_deref().unwrap_or("-"))?;
    ws.write_string(r, 15, &format_opt_brl(row.preco_de))?;
    ws.write_string(r, 16, &format_opt_date(row.data_inicio.as_deref()))?;
    ws.write_string(r, 17, &format_opt_date(row.data_fim.as_deref()))?;
    let sigla = if row.cd_sigla.is_empty() { "-" } else { row.cd_sigla.as_str() };
    ws.write_string(r, 18, sigla)?;
    Ok(())
}

fn format_opt_date(date: Option<&str>) -> String {
    date.map(format_date_br).unwrap_or_else(|| "-".to_string())
}

/// Export the unlabeled items of one branch. The product column is sized
/// to the longest name.
pub fn export_unlabeled(items: &[UnlabeledItem], path: &Path) -> Result<ExportSummary, ExportError> {
    if items.is_empty() {
        return Err(ExportError::Empty);
    }

    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();
    worksheet.set_name(UNLABELED_SHEET)?;

    let product_width = items
        .iter()
        .map(|item| item.nome.chars().count())
        .max()
        .unwrap_or(10)
        .max(10) as f64;
    worksheet.set_column_width(0, 10.0)?;
    worksheet.set_column_width(1, product_width)?;
    worksheet.set_column_width(2, 10.0)?;

    let header = Format::new().set_bold();
    worksheet.write_string_with_format(0, 0, "Código", &header)?;
    worksheet.write_string_with_format(0, 1, "Produto", &header)?;
    worksheet.write_string_with_format(0, 2, "Estoque", &header)?;

    let mut written = 0usize;
    let mut skipped = 0usize;
    for item in items {
        let r = (written + 1) as u32;
        let result = worksheet
            .write_string(r, 0, &item.codigo)
            .and_then(|ws| ws.write_string(r, 1, &item.nome))
            .and_then(|ws| ws.write_string(r, 2, &group_thousands(item.estoque)));
        match result {
            Ok(_) => written += 1,
            Err(e) => {
                warn!(codigo = %item.codigo, error = %e, "skipping item in export");
                skipped += 1;
            }
        }
    }

    workbook.push_worksheet(worksheet);
    workbook.save(path)?;
    Ok(ExportSummary { written, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::normalize_stock;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_filenames() {
        let instant = Utc.with_ymd_and_hms(2025, 11, 3, 17, 5, 9).unwrap();
        assert_eq!(
            stock_filename(instant),
            "consulta-estoque_2025-11-03_14-05-09.xlsx"
        );
        assert_eq!(
            unlabeled_filename("sobral", instant),
            "itens-sem-etiqueta-sobral-2025-11-03.xlsx"
        );
    }

    #[test]
    fn test_export_stock_writes_file() {
        let snapshot = normalize_stock(&json!([
            {
                "CdChamada": "12345",
                "NmProduto": "DISJUNTOR 32A",
                "QtEstoque_Empresa1": 10,
                "StkTotal": 10,
                "VlPreco_Empresa59": 89.9
            },
            {
                "CdChamada": "67890",
                "NmProduto": "CABO FLEX 2,5MM",
                "StkTotal": 320,
                "PrecoPromo": 1.99,
                "StatusPromo": "P",
                "DataInicio": "2025-11-01",
                "DataFim": "2025-11-30"
            }
        ]));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("consulta.xlsx");
        let summary = export_stock(&snapshot.rows, &path).unwrap();

        assert_eq!(summary, ExportSummary { written: 2, skipped: 0 });
        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_export_stock_empty_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vazio.xlsx");
        assert!(matches!(export_stock(&[], &path), Err(ExportError::Empty)));
        assert!(!path.exists());
    }

    #[test]
    fn test_export_unlabeled_writes_file() {
        let items = vec![
            UnlabeledItem {
                codigo: "100".to_string(),
                nome: "CABO FLEX 2,5MM AZUL 100M".to_string(),
                estoque: 320,
            },
            UnlabeledItem {
                codigo: "200".to_string(),
                nome: "TOMADA 10A".to_string(),
                estoque: 14,
            },
        ];

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("itens.xlsx");
        let summary = export_unlabeled(&items, &path).unwrap();

        assert_eq!(summary, ExportSummary { written: 2, skipped: 0 });
        assert!(path.exists());
    }

    #[test]
    fn test_export_unlabeled_empty_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vazio.xlsx");
        assert!(matches!(export_unlabeled(&[], &path), Err(ExportError::Empty)));
    }
}
