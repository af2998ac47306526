use super::{HttpError, MAX_HEAD_SIZE, MAX_HEADERS};
use bytes::{Buf, Bytes, BytesMut};
use http::{
    HeaderMap, HeaderName, HeaderValue, Method, Request, Response, StatusCode, Uri, Version,
    header, request, response,
};
use tokio_util::codec::{Decoder, Encoder};

/// Server-side codec: decodes requests, encodes responses.
///
/// Bodies are framed by `Content-Length` or `Transfer-Encoding: chunked`. A
/// body larger than `max_body_size` fails with [`HttpError::BodyTooLarge`].
#[derive(Debug)]
pub struct RequestCodec {
    max_body_size: usize,
    state: DecodeState<request::Parts>,
}

/// Client-side codec: encodes requests, decodes responses.
#[derive(Debug)]
pub struct ResponseCodec {
    max_body_size: usize,
    state: DecodeState<response::Parts>,
}

#[derive(Debug)]
enum DecodeState<H> {
    Head,
    Body { head: H, body: BodyState },
}

#[derive(Debug)]
enum BodyState {
    Fixed(usize),
    Chunked { buf: BytesMut, chunk: ChunkState },
    UntilClose(BytesMut),
}

#[derive(Debug, Clone, Copy)]
enum ChunkState {
    Size,
    Data(usize),
    DataEnd,
    /// Bytes of trailer section consumed so far
    Trailers(usize),
}

enum BodyProgress {
    Pending(BodyState),
    Done(Bytes),
}

impl RequestCodec {
    pub fn new(max_body_size: usize) -> Self {
        Self {
            max_body_size,
            state: DecodeState::Head,
        }
    }

    fn decode_head(&self, src: &mut BytesMut) -> Result<Option<(request::Parts, BodyState)>, HttpError> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
        let mut req = httparse::Request::new(&mut headers);

        let head_len = match req.parse(&src[..]) {
            Ok(httparse::Status::Complete(n)) => n,
            Ok(httparse::Status::Partial) => return partial_head(src),
            Err(e) => return Err(HttpError::HttpParse(format!("Failed to parse headers: {e}"))),
        };

        let method = req
            .method
            .ok_or_else(|| HttpError::HttpParse("missing method".to_string()))?;
        let method = Method::from_bytes(method.as_bytes())
            .map_err(|e| HttpError::InvalidMessage(format!("bad method: {e}")))?;
        let uri = req
            .path
            .ok_or_else(|| HttpError::HttpParse("missing path".to_string()))?
            .parse::<Uri>()
            .map_err(|e| HttpError::InvalidMessage(format!("bad request target: {e}")))?;
        let version = to_version(req.version);
        let header_map = to_header_map(req.headers)?;

        let (mut parts, ()) = Request::new(()).into_parts();
        parts.method = method;
        parts.uri = uri;
        parts.version = version;
        parts.headers = header_map;

        let body = request_body_state(&parts.headers, self.max_body_size)?;
        src.advance(head_len);
        Ok(Some((parts, body)))
    }
}

impl ResponseCodec {
    pub fn new(max_body_size: usize) -> Self {
        Self {
            max_body_size,
            state: DecodeState::Head,
        }
    }

    fn decode_head(&self, src: &mut BytesMut) -> Result<Option<(response::Parts, BodyState)>, HttpError> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
        let mut res = httparse::Response::new(&mut headers);

        let head_len = match res.parse(&src[..]) {
            Ok(httparse::Status::Complete(n)) => n,
            Ok(httparse::Status::Partial) => return partial_head(src),
            Err(e) => return Err(HttpError::HttpParse(format!("Failed to parse status line: {e}"))),
        };

        let code = res
            .code
            .ok_or_else(|| HttpError::HttpParse("missing status code".to_string()))?;
        let status = StatusCode::from_u16(code)
            .map_err(|e| HttpError::InvalidMessage(format!("bad status code: {e}")))?;
        let version = to_version(res.version);
        let header_map = to_header_map(res.headers)?;

        let (mut parts, ()) = Response::new(()).into_parts();
        parts.status = status;
        parts.version = version;
        parts.headers = header_map;

        let body = if status.is_informational()
            || status == StatusCode::NO_CONTENT
            || status == StatusCode::NOT_MODIFIED
        {
            BodyState::Fixed(0)
        } else {
            match framed_body_state(&parts.headers, self.max_body_size)? {
                Some(state) => state,
                None => BodyState::UntilClose(BytesMut::new()),
            }
        };
        src.advance(head_len);
        Ok(Some((parts, body)))
    }
}

impl Decoder for RequestCodec {
    type Item = Request<Bytes>;
    type Error = HttpError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match std::mem::replace(&mut self.state, DecodeState::Head) {
                DecodeState::Head => match self.decode_head(src)? {
                    Some((head, body)) => self.state = DecodeState::Body { head, body },
                    None => return Ok(None),
                },
                DecodeState::Body { head, body } => {
                    return match decode_body(body, src, self.max_body_size)? {
                        BodyProgress::Pending(body) => {
                            self.state = DecodeState::Body { head, body };
                            Ok(None)
                        }
                        BodyProgress::Done(bytes) => Ok(Some(Request::from_parts(head, bytes))),
                    };
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(request) => Ok(Some(request)),
            None if src.is_empty() && matches!(self.state, DecodeState::Head) => Ok(None),
            None => Err(HttpError::IncompleteMessage),
        }
    }
}

impl Decoder for ResponseCodec {
    type Item = Response<Bytes>;
    type Error = HttpError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match std::mem::replace(&mut self.state, DecodeState::Head) {
                DecodeState::Head => match self.decode_head(src)? {
                    Some((head, body)) => self.state = DecodeState::Body { head, body },
                    None => return Ok(None),
                },
                DecodeState::Body { head, body } => {
                    return match decode_body(body, src, self.max_body_size)? {
                        BodyProgress::Pending(body) => {
                            self.state = DecodeState::Body { head, body };
                            Ok(None)
                        }
                        BodyProgress::Done(bytes) => Ok(Some(Response::from_parts(head, bytes))),
                    };
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(response) = self.decode(src)? {
            return Ok(Some(response));
        }
        match std::mem::replace(&mut self.state, DecodeState::Head) {
            DecodeState::Body {
                head,
                body: BodyState::UntilClose(buf),
            } => Ok(Some(Response::from_parts(head, buf.freeze()))),
            DecodeState::Head if src.is_empty() => Ok(None),
            _ => Err(HttpError::IncompleteMessage),
        }
    }
}

impl Encoder<Response<Bytes>> for RequestCodec {
    type Error = HttpError;

    fn encode(&mut self, item: Response<Bytes>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (parts, body) = item.into_parts();
        let status = parts.status;
        let line = format!(
            "HTTP/1.1 {} {}\r\n",
            status.as_str(),
            status.canonical_reason().unwrap_or("Unknown")
        );
        dst.extend_from_slice(line.as_bytes());
        // 1xx and 204 responses carry neither a body nor a length
        let has_body = !(status.is_informational() || status == StatusCode::NO_CONTENT);
        write_head_fields(&parts.headers, has_body.then_some(body.len()), dst);
        if has_body {
            dst.extend_from_slice(&body);
        }
        Ok(())
    }
}

impl Encoder<Request<Bytes>> for ResponseCodec {
    type Error = HttpError;

    fn encode(&mut self, item: Request<Bytes>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (parts, body) = item.into_parts();
        let target = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let line = format!("{} {} HTTP/1.1\r\n", parts.method, target);
        dst.extend_from_slice(line.as_bytes());
        write_head_fields(&parts.headers, Some(body.len()), dst);
        dst.extend_from_slice(&body);
        Ok(())
    }
}

fn partial_head<T>(src: &BytesMut) -> Result<Option<T>, HttpError> {
    if src.len() > MAX_HEAD_SIZE {
        return Err(HttpError::HttpParse(format!(
            "message head exceeds {MAX_HEAD_SIZE} bytes"
        )));
    }
    Ok(None)
}

fn to_version(version: Option<u8>) -> Version {
    match version {
        Some(0) => Version::HTTP_10,
        _ => Version::HTTP_11,
    }
}

fn to_header_map(headers: &[httparse::Header<'_>]) -> Result<HeaderMap, HttpError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for h in headers {
        let name = HeaderName::from_bytes(h.name.as_bytes())
            .map_err(|e| HttpError::InvalidMessage(format!("bad header name {:?}: {e}", h.name)))?;
        let value = HeaderValue::from_bytes(h.value)
            .map_err(|e| HttpError::InvalidMessage(format!("bad value for header {}: {e}", h.name)))?;
        map.append(name, value);
    }
    Ok(map)
}

/// Requests without any framing header have an empty body.
fn request_body_state(headers: &HeaderMap, limit: usize) -> Result<BodyState, HttpError> {
    Ok(framed_body_state(headers, limit)?.unwrap_or(BodyState::Fixed(0)))
}

fn framed_body_state(headers: &HeaderMap, limit: usize) -> Result<Option<BodyState>, HttpError> {
    if is_chunked(headers) {
        return Ok(Some(BodyState::Chunked {
            buf: BytesMut::new(),
            chunk: ChunkState::Size,
        }));
    }

    let mut length: Option<usize> = None;
    for value in headers.get_all(header::CONTENT_LENGTH) {
        let parsed = value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .ok_or_else(|| HttpError::InvalidMessage("invalid Content-Length".to_string()))?;
        if length.is_some_and(|l| l != parsed) {
            return Err(HttpError::InvalidMessage(
                "conflicting Content-Length headers".to_string(),
            ));
        }
        length = Some(parsed);
    }

    match length {
        Some(len) if len > limit => Err(HttpError::BodyTooLarge { limit }),
        Some(len) => Ok(Some(BodyState::Fixed(len))),
        None => Ok(None),
    }
}

fn is_chunked(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::TRANSFER_ENCODING)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .last()
        .is_some_and(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
}

fn decode_body(state: BodyState, src: &mut BytesMut, limit: usize) -> Result<BodyProgress, HttpError> {
    match state {
        BodyState::Fixed(len) => {
            if src.len() < len {
                src.reserve(len - src.len());
                return Ok(BodyProgress::Pending(BodyState::Fixed(len)));
            }
            Ok(BodyProgress::Done(src.split_to(len).freeze()))
        }
        BodyState::Chunked { mut buf, chunk } => match decode_chunks(&mut buf, chunk, src, limit)? {
            Some(chunk) => Ok(BodyProgress::Pending(BodyState::Chunked { buf, chunk })),
            None => Ok(BodyProgress::Done(buf.freeze())),
        },
        BodyState::UntilClose(mut buf) => {
            if buf.len() + src.len() > limit {
                return Err(HttpError::BodyTooLarge { limit });
            }
            buf.extend_from_slice(&src.split());
            Ok(BodyProgress::Pending(BodyState::UntilClose(buf)))
        }
    }
}

/// Moves chunk data from `src` into `buf`. Returns the state to resume from
/// when more input is needed, or `None` once the last chunk and trailers are
/// consumed.
fn decode_chunks(
    buf: &mut BytesMut,
    mut chunk: ChunkState,
    src: &mut BytesMut,
    limit: usize,
) -> Result<Option<ChunkState>, HttpError> {
    loop {
        chunk = match chunk {
            ChunkState::Size => match httparse::parse_chunk_size(&src[..]) {
                Ok(httparse::Status::Complete((consumed, size))) => {
                    src.advance(consumed);
                    let size = usize::try_from(size)
                        .map_err(|_| HttpError::BodyTooLarge { limit })?;
                    if size == 0 {
                        ChunkState::Trailers(0)
                    } else if buf.len().saturating_add(size) > limit {
                        return Err(HttpError::BodyTooLarge { limit });
                    } else {
                        ChunkState::Data(size)
                    }
                }
                Ok(httparse::Status::Partial) => {
                    if src.len() > MAX_HEAD_SIZE {
                        return Err(HttpError::HttpParse(format!(
                            "chunk size line exceeds {MAX_HEAD_SIZE} bytes"
                        )));
                    }
                    return Ok(Some(chunk));
                }
                Err(_) => return Err(HttpError::HttpParse("invalid chunk size".to_string())),
            },
            ChunkState::Data(remaining) => {
                if src.is_empty() {
                    return Ok(Some(chunk));
                }
                let n = remaining.min(src.len());
                buf.extend_from_slice(&src.split_to(n));
                if n < remaining {
                    return Ok(Some(ChunkState::Data(remaining - n)));
                }
                ChunkState::DataEnd
            }
            ChunkState::DataEnd => {
                if src.len() < 2 {
                    return Ok(Some(chunk));
                }
                if &src[..2] != b"\r\n" {
                    return Err(HttpError::HttpParse("missing CRLF after chunk".to_string()));
                }
                src.advance(2);
                ChunkState::Size
            }
            ChunkState::Trailers(seen) => {
                let pos = src.windows(2).position(|w| w == b"\r\n");
                let line_len = pos.map_or(src.len(), |pos| pos + 2);
                if seen + line_len > MAX_HEAD_SIZE {
                    return Err(HttpError::HttpParse(format!(
                        "chunked trailers exceed {MAX_HEAD_SIZE} bytes"
                    )));
                }
                let Some(pos) = pos else {
                    return Ok(Some(chunk));
                };
                src.advance(pos + 2);
                if pos == 0 {
                    return Ok(None);
                }
                // trailer fields are dropped
                ChunkState::Trailers(seen + pos + 2)
            }
        };
    }
}

fn write_head_fields(headers: &HeaderMap, content_length: Option<usize>, dst: &mut BytesMut) {
    for (name, value) in headers {
        if name == header::CONTENT_LENGTH || name == header::TRANSFER_ENCODING {
            continue;
        }
        dst.extend_from_slice(name.as_str().as_bytes());
        dst.extend_from_slice(b": ");
        dst.extend_from_slice(value.as_bytes());
        dst.extend_from_slice(b"\r\n");
    }
    if let Some(len) = content_length {
        dst.extend_from_slice(format!("content-length: {len}\r\n").as_bytes());
    }
    dst.extend_from_slice(b"\r\n");
}
