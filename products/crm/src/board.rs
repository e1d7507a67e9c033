use serde::Serialize;

use crate::opportunity::Opportunity;
use crate::stage::Stage;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Column {
    pub stage: Stage,
    pub records: Vec<Opportunity>,
    pub total_value: f64,
}

impl Column {
    pub fn count(&self) -> usize {
        self.records.len()
    }
}

/// Kanban board: one column per stage, always all six, in pipeline order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Board {
    pub columns: Vec<Column>,
}

impl Board {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a Opportunity>) -> Self {
        let mut columns: Vec<Column> = Stage::ALL
            .into_iter()
            .map(|stage| Column {
                stage,
                records: Vec::new(),
                total_value: 0.0,
            })
            .collect();
        for record in records {
            let column = &mut columns[record.stage.position()];
            column.total_value += record.value;
            column.records.push(record.clone());
        }
        Self { columns }
    }

    pub fn column(&self, stage: Stage) -> &Column {
        &self.columns[stage.position()]
    }

    /// Where a card dropped on `target` should go; `None` when it did not move.
    pub fn drop_target(&self, id: uuid::Uuid, target: Stage) -> Option<Stage> {
        let current = self
            .columns
            .iter()
            .find(|column| column.records.iter().any(|r| r.id == id))?;
        (current.stage != target).then_some(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opportunity::fixtures::opportunity;

    #[test]
    fn every_stage_gets_a_column() {
        let records = vec![
            opportunity("Flota Norte", 8000.0, Stage::Propuesta),
            opportunity("Hogar Centro", 1200.0, Stage::Propuesta),
            opportunity("Vida Sur", 3000.0, Stage::CerradoPerdido),
        ];
        let board = Board::from_records(&records);
        assert_eq!(board.columns.len(), 6);
        assert_eq!(board.column(Stage::Propuesta).count(), 2);
        assert_eq!(board.column(Stage::Propuesta).total_value, 9200.0);
        assert_eq!(board.column(Stage::Prospecto).count(), 0);
        assert_eq!(board.columns[5].stage, Stage::CerradoPerdido);
    }

    #[test]
    fn dropping_on_the_same_column_is_not_a_move() {
        let records = vec![opportunity("Flota Norte", 8000.0, Stage::Propuesta)];
        let board = Board::from_records(&records);
        let id = records[0].id;
        assert_eq!(board.drop_target(id, Stage::Propuesta), None);
        assert_eq!(board.drop_target(id, Stage::Negociacion), Some(Stage::Negociacion));
        assert_eq!(board.drop_target(uuid::Uuid::new_v4(), Stage::Negociacion), None);
    }
}
