//! IIS service control (MS-IISS)

pub mod iiisservicecontrol;
