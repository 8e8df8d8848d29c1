/// Shared CSV writer for the tabular exporters
use csv::Writer;
use std::error::Error;

/// Writes `headers` followed by one row per item.
///
/// ```rust,ignore
/// let csv = export_to_csv(
///     layout.nodes.iter(),
///     &["id", "display_name"],
///     |node| vec![node.node.id.clone(), node.node.display_name.clone()],
/// )?;
/// ```
pub fn export_to_csv<T, F>(
    items: impl IntoIterator<Item = T>,
    headers: &[&str],
    row_fn: F,
) -> Result<String, Box<dyn Error>>
where
    F: Fn(T) -> Vec<String>,
{
    let mut wtr = Writer::from_writer(vec![]);
    wtr.write_record(headers)?;

    for item in items {
        wtr.write_record(&row_fn(item))?;
    }

    let data = wtr.into_inner()?;
    String::from_utf8(data).map_err(Into::into)
}
