use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tracer_trace::TraceHandle;

// hyper does not expose "request written" or "first response byte", so we sit
// between it and the socket and watch the bytes go by instead.
pub(crate) struct TracingStream<T> {
    inner: T,
    handle: TraceHandle,
    wrote_bytes: bool,
    request_written: bool,
    first_byte: bool,
}

impl<T> TracingStream<T> {
    pub(crate) fn new(inner: T, handle: TraceHandle) -> TracingStream<T> {
        TracingStream {
            inner,
            handle,
            wrote_bytes: false,
            request_written: false,
            first_byte: false,
        }
    }

    fn mark_written(&mut self, error: Option<String>) {
        if !self.request_written {
            self.request_written = true;
            self.handle.request_written(error);
        }
    }
}

impl<T: AsyncRead + Unpin> AsyncRead for TracingStream<T> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        let result = Pin::new(&mut this.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = result {
            if !this.first_byte && buf.filled().len() > before {
                this.first_byte = true;
                this.handle.first_byte();
            }
        }
        result
    }
}

impl<T: AsyncWrite + Unpin> AsyncWrite for TracingStream<T> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let result = Pin::new(&mut this.inner).poll_write(cx, buf);
        match result {
            Poll::Ready(Ok(n)) if n > 0 => this.wrote_bytes = true,
            Poll::Ready(Err(ref e)) => this.mark_written(Some(e.to_string())),
            _ => {}
        }
        result
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let result = Pin::new(&mut this.inner).poll_flush(cx);
        match result {
            Poll::Ready(Ok(())) if this.wrote_bytes => this.mark_written(None),
            Poll::Ready(Err(ref e)) => this.mark_written(Some(e.to_string())),
            _ => {}
        }
        result
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tracer_trace::TraceCollector;

    #[tokio::test]
    async fn flush_after_write_marks_request_written() {
        let mut collector = TraceCollector::default();
        let (client, mut server) = tokio::io::duplex(64);
        let mut stream = TracingStream::new(client, collector.handle());

        stream.flush().await.unwrap();
        collector.process_outstanding();
        assert!(collector.record().request.start.is_none());

        stream.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();
        stream.flush().await.unwrap();
        collector.process_outstanding();
        assert!(collector.record().request.start.is_some());
        assert!(collector.record().first_byte.is_none());

        server.write_all(b"HTTP/1.1 200 OK\r\n").await.unwrap();
        let mut buf = [0u8; 8];
        let n = stream.read(&mut buf).await.unwrap();
        assert!(n > 0);
        collector.process_outstanding();
        let r = collector.record();
        assert!(r.first_byte >= r.request.start);
    }
}
