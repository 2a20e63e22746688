mod req_body;
pub use req_body::ReqBody;
pub use req_body::ReqBodySender;

mod resp_body;
pub use resp_body::ResponseBody;
