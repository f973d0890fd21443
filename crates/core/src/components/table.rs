//! Data tables

use async_trait::async_trait;
use futures::future::try_join_all;
use quest_common::{Error, Result};
use quest_driver::{By, SmartDriver, SmartElement};
use tracing::debug;

use super::{texts, BOOTSTRAP, MATERIAL};
use crate::concept::Concept;
use crate::container::Container;
use crate::registry::component_types;
use crate::service::ComponentService;
use crate::table::{CellCriteria, TableData};

#[async_trait]
pub trait Table: Send + Sync {
    /// Header and cell text of the first table in `container`
    async fn read(&self, container: &Container) -> Result<TableData>;

    async fn row_count(&self, container: &Container) -> Result<usize>;

    /// Click the first row matching every criterion
    async fn click_row(&self, container: &Container, criteria: &[CellCriteria]) -> Result<()>;
}

component_types! {
    pub enum TableType: dyn Table for Concept::Table {
        Bootstrap = "BOOTSTRAP_TABLE" in BOOTSTRAP => GridTable::bootstrap,
        Material = "MATERIAL_TABLE" in MATERIAL => GridTable::material,
    }
}

/// Row, header and cell selectors are relative to the table element and only
/// match its own direct structure, never that of a table nested in a cell
struct GridMarkup {
    table: &'static str,
    header: &'static str,
    row: &'static str,
    cell: &'static str,
}

pub struct GridTable {
    driver: SmartDriver,
    markup: GridMarkup,
}

impl GridTable {
    pub fn bootstrap(driver: SmartDriver) -> Self {
        Self {
            driver,
            markup: GridMarkup {
                table: "table.table",
                header: ":scope > thead > tr > th",
                row: ":scope > tbody > tr",
                cell: ":scope > td",
            },
        }
    }

    pub fn material(driver: SmartDriver) -> Self {
        Self {
            driver,
            markup: GridMarkup {
                table: "table.mat-mdc-table, mat-table",
                header: ":scope > thead > tr > th.mat-mdc-header-cell, :scope > mat-header-row > mat-header-cell",
                row: ":scope > tbody > tr.mat-mdc-row, :scope > mat-row",
                cell: ":scope > td.mat-mdc-cell, :scope > mat-cell",
            },
        }
    }

    async fn table(&self, container: &Container) -> Result<SmartElement> {
        container.find(&self.driver, &By::css(self.markup.table)).await
    }

    async fn rows(&self, table: &SmartElement) -> Result<Vec<SmartElement>> {
        table.scan(&By::css(self.markup.row)).await
    }

    async fn snapshot(&self, table: &SmartElement, rows: &[SmartElement]) -> Result<TableData> {
        let headers = texts(&table.scan(&By::css(self.markup.header)).await?).await?;
        let cell_by = By::css(self.markup.cell);

        let mut data = Vec::with_capacity(rows.len());
        for row in rows {
            let cells = row.scan(&cell_by).await?;
            let values = try_join_all(cells.iter().map(|cell| cell.text())).await?;
            data.push(values.into_iter().map(|v| v.trim().to_string()).collect());
        }
        Ok(TableData::new(headers, data))
    }
}

#[async_trait]
impl Table for GridTable {
    async fn read(&self, container: &Container) -> Result<TableData> {
        let table = self.table(container).await?;
        let rows = self.rows(&table).await?;
        let data = self.snapshot(&table, &rows).await?;
        debug!("Read table with {} column(s), {} row(s)", data.headers.len(), data.len());
        Ok(data)
    }

    async fn row_count(&self, container: &Container) -> Result<usize> {
        let table = self.table(container).await?;
        Ok(self.rows(&table).await?.len())
    }

    async fn click_row(&self, container: &Container, criteria: &[CellCriteria]) -> Result<()> {
        let table = self.table(container).await?;
        let rows = self.rows(&table).await?;
        let data = self.snapshot(&table, &rows).await?;

        match data.find_row(criteria)? {
            Some(index) => rows[index].click().await,
            None => Err(Error::not_found(format!("table row matching {:?}", criteria))),
        }
    }
}

pub type TableService = ComponentService<TableType>;

impl ComponentService<TableType> {
    pub async fn read(&self, container: &Container) -> Result<TableData> {
        self.component(None)?.read(container).await
    }

    pub async fn read_as(&self, ty: TableType, container: &Container) -> Result<TableData> {
        self.get_or_create(ty).read(container).await
    }

    pub async fn row_count(&self, container: &Container) -> Result<usize> {
        self.component(None)?.row_count(container).await
    }

    pub async fn row_count_as(&self, ty: TableType, container: &Container) -> Result<usize> {
        self.get_or_create(ty).row_count(container).await
    }

    pub async fn click_row(&self, container: &Container, criteria: &[CellCriteria]) -> Result<()> {
        self.component(None)?.click_row(container, criteria).await
    }

    pub async fn click_row_as(
        &self,
        ty: TableType,
        container: &Container,
        criteria: &[CellCriteria],
    ) -> Result<()> {
        self.get_or_create(ty).click_row(container, criteria).await
    }
}
