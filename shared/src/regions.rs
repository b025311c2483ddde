use crate::errors::FunctionError;
use std::fmt;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceFamily {
    CodeEngine,
    PowerIaas,
}

impl ServiceFamily {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ServiceFamily::CodeEngine => "code_engine",
            ServiceFamily::PowerIaas => "power_iaas",
        }
    }
}

impl fmt::Display for ServiceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const POWER_IAAS_ENDPOINTS: &[(&str, &str)] = &[
    ("au-syd", "https://syd.power-iaas.cloud.ibm.com/pcloud/v1"),
    ("br-sao", "https://sao.power-iaas.cloud.ibm.com/pcloud/v1"),
    ("ca-mon", "https://mon.power-iaas.cloud.ibm.com/pcloud/v1"),
    ("ca-tor", "https://tor.power-iaas.cloud.ibm.com/pcloud/v1"),
    ("eu-de", "https://eu-de.power-iaas.cloud.ibm.com/pcloud/v1"),
    ("eu-es", "https://mad.power-iaas.cloud.ibm.com/pcloud/v1"),
    ("eu-gb", "https://lon.power-iaas.cloud.ibm.com/pcloud/v1"),
    ("jp-osa", "https://osa.power-iaas.cloud.ibm.com/pcloud/v1"),
    ("jp-tok", "https://tok.power-iaas.cloud.ibm.com/pcloud/v1"),
    ("us-east", "https://us-east.power-iaas.cloud.ibm.com/pcloud/v1"),
    ("us-south", "https://us-south.power-iaas.cloud.ibm.com/pcloud/v1"),
    ("in-che", "https://che.power-iaas.cloud.ibm.com/pcloud/v1"),
];

const CODE_ENGINE_ENDPOINTS: &[(&str, &str)] = &[
    ("au-syd", "https://api.au-syd.codeengine.cloud.ibm.com/v2"),
    ("br-sao", "https://api.br-sao.codeengine.cloud.ibm.com/v2"),
    ("ca-tor", "https://api.ca-tor.codeengine.cloud.ibm.com/v2"),
    ("eu-de", "https://api.eu-de.codeengine.cloud.ibm.com/v2"),
    ("eu-es", "https://api.eu-es.codeengine.cloud.ibm.com/v2"),
    ("eu-gb", "https://api.eu-gb.codeengine.cloud.ibm.com/v2"),
    ("jp-osa", "https://api.jp-osa.codeengine.cloud.ibm.com/v2"),
    ("jp-tok", "https://api.jp-tok.codeengine.cloud.ibm.com/v2"),
    ("us-east", "https://api.us-east.codeengine.cloud.ibm.com/v2"),
    ("us-south", "https://api.us-south.codeengine.cloud.ibm.com/v2"),
];

/// Returns the base URL of `family` in `region`, or `None` if the region
/// has no endpoint for that service.
pub fn service_url_for_region(region: &str, family: ServiceFamily) -> Option<&'static str> {
    let table = match family {
        ServiceFamily::CodeEngine => CODE_ENGINE_ENDPOINTS,
        ServiceFamily::PowerIaas => POWER_IAAS_ENDPOINTS,
    };

    table
        .iter()
        .find(|(code, _)| *code == region)
        .map(|(_, url)| *url)
}

/// Resolves and parses the endpoint. An unknown region is a reported
/// configuration error, never a default endpoint.
pub fn resolve(region: &str, family: ServiceFamily) -> Result<Url, FunctionError> {
    let base = service_url_for_region(region, family).ok_or_else(|| {
        FunctionError::NotFound(format!("No {family} endpoint found for region '{region}'"))
    })?;

    Url::parse(base).map_err(|e| FunctionError::Internal(format!("invalid endpoint {base}: {e}")))
}
