use anyhow::{bail, Context, Result};
use arrow::{
    array::{Array, ArrayRef, Float64Array, Float64Builder, StringArray, StringBuilder},
    compute::cast,
    datatypes::{DataType, Field as ArrowField, Schema as ArrowSchema},
    record_batch::{RecordBatch, RecordBatchOptions},
};
use std::sync::Arc;

use crate::table::{CanonicalTable, Column, ColumnData};

/// Numeric measures → Float64, descriptive columns → Utf8. Every field is
/// nullable; null is the "missing" marker.
pub fn map_to_arrow_type(data: &ColumnData) -> DataType {
    match data {
        ColumnData::Number(_) => DataType::Float64,
        ColumnData::Text(_) => DataType::Utf8,
    }
}

pub fn build_arrow_schema(table: &CanonicalTable) -> Arc<ArrowSchema> {
    let fields: Vec<ArrowField> = table
        .columns()
        .iter()
        .map(|col| ArrowField::new(&col.name, map_to_arrow_type(&col.data), true))
        .collect();
    Arc::new(ArrowSchema::new(fields))
}

/// One batch holding the whole table.
pub fn to_record_batch(table: &CanonicalTable) -> Result<RecordBatch> {
    let schema = build_arrow_schema(table);
    let columns: Vec<ArrayRef> = table
        .columns()
        .iter()
        .map(|col| match &col.data {
            ColumnData::Number(v) => {
                let mut b = Float64Builder::with_capacity(v.len());
                for x in v {
                    b.append_option(*x);
                }
                Arc::new(b.finish()) as ArrayRef
            }
            ColumnData::Text(v) => {
                let mut b = StringBuilder::new();
                for s in v {
                    b.append_option(s.as_deref());
                }
                Arc::new(b.finish()) as ArrayRef
            }
        })
        .collect();
    let options = RecordBatchOptions::new().with_row_count(Some(table.len()));
    RecordBatch::try_new_with_options(schema, columns, &options)
        .context("building snapshot RecordBatch")
}

/// Rebuild a table from the batches of one snapshot. Float columns of
/// other widths are widened to Float64; anything else is read as text.
pub fn from_batches(schema: &ArrowSchema, batches: &[RecordBatch]) -> Result<CanonicalTable> {
    let len: usize = batches.iter().map(RecordBatch::num_rows).sum();
    let mut table = CanonicalTable::with_len(len);

    for (idx, field) in schema.fields().iter().enumerate() {
        let numeric = matches!(
            field.data_type(),
            DataType::Float16 | DataType::Float32 | DataType::Float64
        );
        let data = if numeric {
            let mut values = Vec::with_capacity(len);
            for batch in batches {
                let arr = cast(batch.column(idx), &DataType::Float64)
                    .with_context(|| format!("casting `{}` to Float64", field.name()))?;
                let Some(arr) = arr.as_any().downcast_ref::<Float64Array>() else {
                    bail!("column `{}` is not Float64 after cast", field.name());
                };
                values.extend(arr.iter());
            }
            ColumnData::Number(values)
        } else {
            let mut values = Vec::with_capacity(len);
            for batch in batches {
                let arr = cast(batch.column(idx), &DataType::Utf8)
                    .with_context(|| format!("casting `{}` to Utf8", field.name()))?;
                let Some(arr) = arr.as_any().downcast_ref::<StringArray>() else {
                    bail!("column `{}` is not Utf8 after cast", field.name());
                };
                values.extend(arr.iter().map(|s| s.map(str::to_string)));
            }
            ColumnData::Text(values)
        };
        if table.has(field.name()) {
            bail!("snapshot repeats column `{}`", field.name());
        }
        table.put(Column {
            name: field.name().clone(),
            data,
        });
    }
    Ok(table)
}
