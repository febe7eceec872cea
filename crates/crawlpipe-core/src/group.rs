//! Run-length grouping of url-id ordered records

use crate::caster::Record;
use crate::error::{Error, Result};

/// Groups contiguous records sharing the same leading url id.
///
/// Relies on the stream being sorted by url id: a url id that shows up again
/// after another one starts a new group rather than joining the first.
pub struct GroupByUrlId<I> {
    inner: I,
    pending: Option<Record>,
    failed: bool,
}

impl<I> GroupByUrlId<I>
where
    I: Iterator<Item = Result<Record>>,
{
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            pending: None,
            failed: false,
        }
    }

    fn fail(&mut self, err: Error) -> Option<Result<(i64, Vec<Record>)>> {
        self.failed = true;
        Some(Err(err))
    }
}

impl<I> Iterator for GroupByUrlId<I>
where
    I: Iterator<Item = Result<Record>>,
{
    type Item = Result<(i64, Vec<Record>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let first = match self.pending.take() {
            Some(record) => record,
            None => match self.inner.next()? {
                Ok(record) => record,
                Err(e) => return self.fail(e),
            },
        };
        let Some(url_id) = first.url_id() else {
            return self.fail(Error::Cast {
                column: "id",
                value: format!("{:?}", first.get(0)),
                reason: "records are not keyed by an integer url id".to_string(),
            });
        };

        let mut group = vec![first];
        loop {
            match self.inner.next() {
                None => break,
                Some(Ok(record)) if record.url_id() == Some(url_id) => group.push(record),
                Some(Ok(record)) => {
                    self.pending = Some(record);
                    break;
                }
                Some(Err(e)) => return self.fail(e),
            }
        }
        Some(Ok((url_id, group)))
    }
}
