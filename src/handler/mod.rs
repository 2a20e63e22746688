//! The handler contract.
//!
//! A handler turns one request, with its streaming body, into one response.
//! It may read the body fully, partially, or not at all (the connection
//! drains the rest), and it never writes to the socket itself: the response
//! body's size hint decides the framing the connection applies.

use std::error::Error;
use std::future::Future;

use http::{Request, Response};
use http_body::Body;

use crate::protocol::body::ReqBody;

pub trait Handler: Send + Sync {
    type RespBody: Body;

    type Error: Into<Box<dyn Error + Send + Sync>>;

    type Fut<'fut>: Future<Output = Result<Response<Self::RespBody>, Self::Error>> + Send
    where
        Self: 'fut;

    fn call(&self, req: Request<ReqBody>) -> Self::Fut<'_>;
}

/// Adapts a plain async function into a [`Handler`].
#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

impl<RespBody, Err, F, Fut> Handler for HandlerFn<F>
where
    RespBody: Body,
    F: Fn(Request<ReqBody>) -> Fut + Send + Sync,
    Err: Into<Box<dyn Error + Send + Sync>>,
    Fut: Future<Output = Result<Response<RespBody>, Err>> + Send,
{
    type RespBody = RespBody;
    type Error = Err;
    type Fut<'fut> = Fut where Self: 'fut;

    fn call(&self, req: Request<ReqBody>) -> Self::Fut<'_> {
        (self.f)(req)
    }
}

pub fn make_handler<F, RespBody, Err, Ret>(f: F) -> HandlerFn<F>
where
    RespBody: Body,
    Err: Into<Box<dyn Error + Send + Sync>>,
    Ret: Future<Output = Result<Response<RespBody>, Err>> + Send,
    F: Fn(Request<ReqBody>) -> Ret + Send + Sync,
{
    HandlerFn { f }
}
